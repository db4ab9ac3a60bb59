//! Certificate Services view interfaces (MS-CSRA 3.1.4.1)

pub mod icertview;

/// `fResultColumn` values accepted by the column queries
pub mod column_kind {
    /// Every column of the schema
    pub const SCHEMA: i32 = 0;
    /// Only the columns picked with `SetResultColumn`
    pub const RESULT_COLUMN: i32 = 1;
}

/// `SeekOperator` values for `SetRestriction`
pub mod seek {
    pub const EQ: i32 = 0x1;
    pub const LT: i32 = 0x2;
    pub const LE: i32 = 0x4;
    pub const GE: i32 = 0x8;
    pub const GT: i32 = 0x10;
}

/// `SortOrder` values for `SetRestriction`
pub mod sort {
    pub const NONE: i32 = 0;
    pub const ASCEND: i32 = 1;
    pub const DESCEND: i32 = 2;
}
