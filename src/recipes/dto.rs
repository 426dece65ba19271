use serde::{Deserialize, Serialize};

use crate::recipes::repo::{Ingredient, Recipe};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
    pub preparation_time: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<String>,
    pub preparation_time: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub status: &'static str,
    pub recipe: Recipe,
}

impl RecipeResponse {
    pub fn success(recipe: Recipe) -> Self {
        Self {
            status: "success",
            recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipesListResponse {
    pub status: &'static str,
    pub recipes: Vec<Recipe>,
}

impl RecipesListResponse {
    pub fn success(recipes: Vec<Recipe>) -> Self {
        Self {
            status: "success",
            recipes,
        }
    }
}
