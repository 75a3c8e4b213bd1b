use mongodb::bson::{doc, Document};

/// A filter matching a document by its integer ID.
pub fn u32_id_filter(id: u32) -> Document {
    doc! {
        "_id": id,
    }
}
