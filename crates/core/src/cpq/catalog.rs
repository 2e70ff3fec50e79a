use crate::domain::product::{ProductId, ServerProduct, UseCase};
use crate::fixtures::{self, FixtureError, BUILTIN_PRODUCTS};

/// Ordered, immutable product list. Order is significant: selection and fallback
/// both read it front to back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    products: Vec<ServerProduct>,
}

impl Catalog {
    pub fn new(products: Vec<ServerProduct>) -> Self {
        Self { products }
    }

    pub fn builtin() -> Result<Self, FixtureError> {
        Self::from_json_str(BUILTIN_PRODUCTS)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, FixtureError> {
        fixtures::parse_list("products", raw).map(Self::new)
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&ServerProduct> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    pub fn products(&self) -> &[ServerProduct] {
        &self.products
    }

    pub fn tagged(&self, use_case: UseCase) -> impl Iterator<Item = &ServerProduct> + '_ {
        self.products.iter().filter(move |product| product.supports(use_case))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{ProductId, UseCase};

    use super::Catalog;

    #[test]
    fn tagged_preserves_catalog_order() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let ids: Vec<&str> =
            catalog.tagged(UseCase::Virtualization).map(|product| product.id.as_str()).collect();

        assert_eq!(
            ids,
            vec!["proliant-dl380-gen11", "proliant-dl380-gen10-plus", "proliant-dl385-gen11"]
        );
    }

    #[test]
    fn find_returns_none_for_unknown_ids() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        assert!(catalog.find(&ProductId::new("proliant-dl380-gen11")).is_some());
        assert!(catalog.find(&ProductId::new("synergy-480")).is_none());
        assert_eq!(catalog.len(), 7);
        assert!(!catalog.is_empty());
    }
}
