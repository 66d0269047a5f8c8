use crate::{
    db_types::{LinkConversion, NewLinkConversion, Platform},
    traits::LedgerError,
};

#[allow(async_fn_in_trait)]
pub trait LinkConversionManagement {
    async fn insert_link_conversion(&self, conversion: NewLinkConversion) -> Result<LinkConversion, LedgerError>;

    /// The most recently created conversion for the given product, if any user has ever converted it.
    async fn latest_link_conversion(
        &self,
        platform: Platform,
        product_id: &str,
    ) -> Result<Option<LinkConversion>, LedgerError>;
}
