use serde::{Deserialize, Serialize};

/// Kind of purchasable item carried by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Session,
    EventPackage,
}

/// One purchasable line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    /// Unit price in rupiah, as priced by the server.
    pub price: u64,
    /// The event this session or package belongs to.
    pub parent_event_ref: String,
}

impl CartItem {
    pub fn new(
        id: impl Into<String>,
        kind: ItemKind,
        title: impl Into<String>,
        price: u64,
        parent_event_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            price,
            parent_event_ref: parent_event_ref.into(),
        }
    }
}

/// Server-tracked cart snapshot.
///
/// `total_price` is always the server's number. Discount math lives on the
/// backend, so the client never sums `items` itself: any mutation is
/// followed by a re-fetch instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub applied_code: Option<String>,
    pub total_price: u64,
    pub item_count: u32,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a promotional code is currently attached.
    pub fn has_applied_code(&self) -> bool {
        self.applied_code.is_some()
    }
}
