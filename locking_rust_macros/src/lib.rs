mod record;

use proc_macro::TokenStream;

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "tickets")]
/// pub struct Ticket {
///     pub name: String,
///     pub booked: bool,
/// }
/// ```
///
/// Without `collection`, the collection name is the snake_case struct name
/// with an `s` appended (`InventoryItem` becomes `inventory_items`).
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
