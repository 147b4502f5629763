mod table_data;
mod table_operations;

pub use table_data::{HashTableData, TableSlot};
pub use table_operations::{alloc_block, delete_hash_entry_element, find, AllocOutcome, DeleteOutcome};
