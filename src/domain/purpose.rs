use serde::{Deserialize, Serialize};

/// The fixed catalog of investment purposes offered when recording a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    KitchenEquipment,
    FurnitureAndFixtures,
    InteriorDesign,
    LicensingAndPermits,
    RentAndDeposit,
    StaffRecruitment,
    MarketingAndAdvertising,
    InitialInventory,
    UtilitiesSetup,
    Insurance,
    LegalFees,
    TechnologyAndPos,
    Miscellaneous,
}

impl Category {
    /// Every catalog entry, in the order it is presented to the user.
    pub const ALL: [Category; 13] = [
        Category::KitchenEquipment,
        Category::FurnitureAndFixtures,
        Category::InteriorDesign,
        Category::LicensingAndPermits,
        Category::RentAndDeposit,
        Category::StaffRecruitment,
        Category::MarketingAndAdvertising,
        Category::InitialInventory,
        Category::UtilitiesSetup,
        Category::Insurance,
        Category::LegalFees,
        Category::TechnologyAndPos,
        Category::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::KitchenEquipment => "Kitchen Equipment",
            Category::FurnitureAndFixtures => "Furniture & Fixtures",
            Category::InteriorDesign => "Interior Design",
            Category::LicensingAndPermits => "Licensing & Permits",
            Category::RentAndDeposit => "Rent & Deposit",
            Category::StaffRecruitment => "Staff Recruitment",
            Category::MarketingAndAdvertising => "Marketing & Advertising",
            Category::InitialInventory => "Initial Inventory",
            Category::UtilitiesSetup => "Utilities Setup",
            Category::Insurance => "Insurance",
            Category::LegalFees => "Legal Fees",
            Category::TechnologyAndPos => "Technology & POS",
            Category::Miscellaneous => "Miscellaneous",
        }
    }

    /// Look up a catalog entry by display name, ignoring case and surrounding whitespace.
    pub fn from_str(s: &str) -> Option<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the caller chose a purpose: from the catalog or as free text.
/// Both resolve to the plain string stored on the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purpose {
    Catalog(Category),
    Custom(String),
}

impl Purpose {
    pub fn as_str(&self) -> &str {
        match self {
            Purpose::Catalog(category) => category.as_str(),
            Purpose::Custom(text) => text,
        }
    }
}

impl From<Category> for Purpose {
    fn from(category: Category) -> Self {
        Purpose::Catalog(category)
    }
}

impl From<String> for Purpose {
    fn from(text: String) -> Self {
        Purpose::Custom(text)
    }
}

impl From<&str> for Purpose {
    fn from(text: &str) -> Self {
        Purpose::Custom(text.to_string())
    }
}
