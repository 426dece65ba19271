use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Json<Vec<Ingredient>>,
    pub instructions: String,
    pub preparation_time: i32,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

impl Recipe {
    pub async fn create(
        db: &PgPool,
        title: &str,
        ingredients: Vec<Ingredient>,
        instructions: &str,
        preparation_time: i32,
        created_by: Uuid,
    ) -> anyhow::Result<Recipe> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (title, ingredients, instructions, preparation_time, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, ingredients, instructions, preparation_time, created_by, created_at
            "#,
        )
        .bind(title)
        .bind(Json(ingredients))
        .bind(instructions)
        .bind(preparation_time)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(recipe)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, title, ingredients, instructions, preparation_time, created_by, created_at
            FROM recipes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(recipes)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, title, ingredients, instructions, preparation_time, created_by, created_at
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(recipe)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        ingredients: Option<Vec<Ingredient>>,
        instructions: Option<&str>,
        preparation_time: Option<i32>,
    ) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
            SET title = COALESCE($2, title),
                ingredients = COALESCE($3, ingredients),
                instructions = COALESCE($4, instructions),
                preparation_time = COALESCE($5, preparation_time)
            WHERE id = $1
            RETURNING id, title, ingredients, instructions, preparation_time, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(ingredients.map(Json))
        .bind(instructions)
        .bind(preparation_time)
        .fetch_optional(db)
        .await?;
        Ok(recipe)
    }

    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            DELETE FROM recipes
            WHERE id = $1
            RETURNING id, title, ingredients, instructions, preparation_time, created_by, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_serializes_with_camel_case_wire_names() {
        let recipe = Recipe {
            id: Uuid::new_v4(),
            title: "Shakshuka".into(),
            ingredients: Json(vec![
                Ingredient {
                    name: "eggs".into(),
                    quantity: Some("4".into()),
                },
                Ingredient {
                    name: "tomatoes".into(),
                    quantity: None,
                },
            ]),
            instructions: "Simmer, crack, cover.".into(),
            preparation_time: 25,
            created_by: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&recipe).expect("serialize");
        assert!(json.contains(r#""preparationTime":25"#));
        assert!(json.contains(r#""createdBy""#));
        assert!(json.contains(r#""name":"eggs""#));
    }

    #[test]
    fn ingredient_quantity_is_optional_on_the_wire() {
        let ingredient: Ingredient =
            serde_json::from_str(r#"{"name":"salt"}"#).expect("deserialize");
        assert_eq!(ingredient.name, "salt");
        assert!(ingredient.quantity.is_none());
    }
}
