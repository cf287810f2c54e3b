#![doc = r"Reference widgets for lazy forms, plus the hero/address models they render."]

pub mod address;
pub mod address_list;
pub mod models;
pub mod select;
pub mod text_input;

pub use address::{AddressGroup, ADDRESS_GROUP};
pub use address_list::{AddressList, ADDRESS_LIST};
pub use models::{Address, Hero};
pub use select::{Select, SELECT};
pub use text_input::{TextInput, TEXT_INPUT};
