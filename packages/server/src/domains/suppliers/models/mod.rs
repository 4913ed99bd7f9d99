pub mod supplier;

pub use supplier::{SupplierFilter, SupplierRecord, UNKNOWN_SUPPLIER_NAME};
