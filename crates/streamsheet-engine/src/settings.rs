/// Configuration for one sheet's scan region.
#[derive(Debug, Clone)]
pub struct SheetSettings {
    /// First scannable row; the cursor never sits above it.
    pub min_row: u32,
    /// Last row the grid may allocate.
    pub max_row: u32,
    /// Number of data columns the grid may allocate.
    pub max_col: u32,
    /// Width of the pre-row region (reserved columns IF, COMMENT, …).
    pub pre_cols: u8,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            min_row: 1,
            max_row: 100,
            max_col: 52,
            pre_cols: 2,
        }
    }
}
