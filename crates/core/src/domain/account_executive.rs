use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountExecutiveId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountExecutive {
    pub id: AccountExecutiveId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Cosmetic label only; assignment never matches on territory.
    pub territory: String,
}
