//! sea-orm models for the relational half of the portal: procurement
//! requisitions, suppliers and inventory.

pub mod inventory_items;
pub mod requisitions;
pub mod suppliers;
