pub mod ingredient;
pub mod product;

pub use ingredient::{
    DietType, IngredientProfile, SourceDetail, SourceId, SourcePayload, SourceResult,
    DEFAULT_SAFETY_RATING, DESC_NO_INFO,
};
pub use product::{BatchOutcome, HealthInsights, ProductAnalysis, UserPreferences};
