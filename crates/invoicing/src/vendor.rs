use spendlens_core::{DomainError, DomainResult, Entity, VendorId};

/// Stored vendor. Names are unique across the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl Entity for Vendor {
    type Id = VendorId;

    fn id(&self) -> VendorId {
        self.id
    }
}

/// Vendor about to be upserted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVendor {
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl NewVendor {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("vendor name is required"));
        }
        Ok(())
    }

    pub fn into_vendor(self, id: VendorId) -> DomainResult<Vendor> {
        self.validate()?;
        Ok(Vendor {
            id,
            name: self.name,
            address: self.address,
            tax_id: self.tax_id,
        })
    }
}
