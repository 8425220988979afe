//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellError,
    CellValue,
    // Error types
    Error,
    // Positions and sizes
    Position,
    Result,
    // Main types
    Sheet,
    Size,
};
