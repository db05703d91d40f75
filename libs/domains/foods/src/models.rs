use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Barcode lengths accepted as plausible EAN/UPC/ITF codes
const BARCODE_LENGTHS: [usize; 4] = [8, 12, 13, 24];

/// Name of the counter document backing internally generated codes
pub const CODE_SEQUENCE: &str = "food_code";

/// Food entity stored in the `foods` collection
///
/// The document id doubles as the business code: either a scanned barcode
/// or an internally generated `200`-prefixed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    /// Unique identifier (stored as _id in MongoDB), always equal to `code`
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Business code: barcode or generated internal code
    pub code: String,
    /// Display name
    pub product_name: String,
    /// Generic product description (e.g. "orange juice")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    /// Comma-separated brand names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<String>,
    /// Product image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Search keywords, populated asynchronously after creation
    #[serde(rename = "_keywords", default)]
    pub keywords: Vec<String>,
    /// Nutritional values per 100g and per piece
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriments: Option<Nutriments>,
    /// Owning user for user-submitted foods, absent for the shared catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Nutritional values.
///
/// Field names follow the OpenFoodFacts convention, hence the dashes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal", default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proteins: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
    #[serde(
        rename = "energy-kcal_piece",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub energy_kcal_piece: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_piece: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proteins_piece: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates_piece: Option<f64>,
}

/// Payload for creating a food
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFood {
    /// Scanned barcode. When absent or implausible a code is generated.
    pub code: Option<String>,
    #[validate(length(min = 1, message = "product_name must not be empty"))]
    pub product_name: String,
    pub generic_name: Option<String>,
    pub brands: Option<String>,
    pub image_url: Option<String>,
    #[validate(custom(function = "at_least_one_nutrient"))]
    pub nutriments: Option<Nutriments>,
}

fn at_least_one_nutrient(nutriments: &Nutriments) -> Result<(), ValidationError> {
    let present = nutriments.energy_kcal.is_some()
        || nutriments.fat.is_some()
        || nutriments.proteins.is_some()
        || nutriments.carbohydrates.is_some()
        || nutriments.energy_kcal_piece.is_some()
        || nutriments.fat_piece.is_some()
        || nutriments.proteins_piece.is_some()
        || nutriments.carbohydrates_piece.is_some();
    if present {
        Ok(())
    } else {
        Err(ValidationError::new("at_least_one_nutrient")
            .with_message("nutriments must carry at least one value".into()))
    }
}

/// Partial update for a food; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatchFood {
    #[validate(length(min = 1, message = "product_name must not be empty"))]
    pub product_name: Option<String>,
    pub generic_name: Option<String>,
    pub brands: Option<String>,
    pub image_url: Option<String>,
    pub nutriments: Option<PatchNutriments>,
}

/// Partial update for nutriments, merged field by field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchNutriments {
    #[serde(rename = "energy-kcal")]
    pub energy_kcal: Option<f64>,
    pub fat: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    #[serde(rename = "energy-kcal_piece")]
    pub energy_kcal_piece: Option<f64>,
    pub fat_piece: Option<f64>,
    pub proteins_piece: Option<f64>,
    pub carbohydrates_piece: Option<f64>,
}

impl Food {
    /// Build a food from a create request and a resolved code.
    pub fn from_create(input: &CreateFood, code: String, user_id: Option<String>) -> Self {
        Self {
            id: code.clone(),
            code,
            product_name: input.product_name.clone(),
            generic_name: input.generic_name.clone(),
            brands: input.brands.clone(),
            image_url: input.image_url.clone(),
            keywords: Vec::new(),
            nutriments: input.nutriments.clone(),
            user_id,
        }
    }

    /// Whether an existing food is equivalent to a create request.
    ///
    /// Used to decide if a code collision is an idempotent replay
    /// (same payload) or a genuine conflict.
    pub fn matches_request(&self, input: &CreateFood) -> bool {
        self.product_name == input.product_name
            && self.generic_name == input.generic_name
            && self.brands == input.brands
            && self.nutriments == input.nutriments
    }

    /// Apply a partial update. Identity fields (`id`, `code`) are immutable.
    pub fn apply_patch(&mut self, patch: &PatchFood) {
        if let Some(name) = &patch.product_name {
            self.product_name = name.clone();
        }
        if let Some(generic) = &patch.generic_name {
            self.generic_name = Some(generic.clone());
        }
        if let Some(brands) = &patch.brands {
            self.brands = Some(brands.clone());
        }
        if let Some(url) = &patch.image_url {
            self.image_url = Some(url.clone());
        }
        if let Some(patch_nutriments) = &patch.nutriments {
            let nutriments = self.nutriments.get_or_insert_with(Nutriments::default);
            nutriments.merge(patch_nutriments);
        }
    }
}

impl Nutriments {
    fn merge(&mut self, patch: &PatchNutriments) {
        if patch.energy_kcal.is_some() {
            self.energy_kcal = patch.energy_kcal;
        }
        if patch.fat.is_some() {
            self.fat = patch.fat;
        }
        if patch.proteins.is_some() {
            self.proteins = patch.proteins;
        }
        if patch.carbohydrates.is_some() {
            self.carbohydrates = patch.carbohydrates;
        }
        if patch.energy_kcal_piece.is_some() {
            self.energy_kcal_piece = patch.energy_kcal_piece;
        }
        if patch.fat_piece.is_some() {
            self.fat_piece = patch.fat_piece;
        }
        if patch.proteins_piece.is_some() {
            self.proteins_piece = patch.proteins_piece;
        }
        if patch.carbohydrates_piece.is_some() {
            self.carbohydrates_piece = patch.carbohydrates_piece;
        }
    }
}

/// Whether a candidate code looks like a real barcode: digits only and one
/// of the standard EAN-8/UPC-A/EAN-13/ITF lengths.
pub fn is_plausible_barcode(code: &str) -> bool {
    !code.is_empty()
        && code.bytes().all(|b| b.is_ascii_digit())
        && BARCODE_LENGTHS.contains(&code.len())
}

/// Format an internally generated code: prefix `200` plus the sequence
/// value zero-padded to ten digits.
pub fn internal_code(sequence: i64) -> String {
    format!("200{:010}", sequence)
}
