//! SQLite persistence for materials and recipes

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::calculator::RecipeSource;
use crate::models::{GRID_SLOTS, Material, Recipe, RecipeCell};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Materials known to the calculator, crafted or raw
        CREATE TABLE IF NOT EXISTS materials (
            name TEXT PRIMARY KEY
        );

        -- One recipe per produced item
        CREATE TABLE IF NOT EXISTS recipes (
            result_item TEXT PRIMARY KEY,
            result_quantity INTEGER NOT NULL CHECK (result_quantity >= 1),
            crafting_time REAL CHECK (crafting_time >= 0)
        );

        -- Occupied cells of the 3x3 grid, row-major slots 0-8
        CREATE TABLE IF NOT EXISTS recipe_cells (
            result_item TEXT NOT NULL,
            slot INTEGER NOT NULL CHECK (slot BETWEEN 0 AND 8),
            material TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            PRIMARY KEY (result_item, slot)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_cells_item ON recipe_cells(result_item);
        "#,
    )?;
    Ok(())
}

/// Register a material, keeping an existing row as-is
pub fn upsert_material(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO materials (name) VALUES (?1)",
        params![name],
    )?;
    Ok(())
}

/// Remove a material along with any recipe that produces it
pub fn remove_material(conn: &Connection, name: &str) -> Result<()> {
    remove_recipe(conn, name)?;
    conn.execute("DELETE FROM materials WHERE name = ?1", params![name])?;
    Ok(())
}

/// Insert or replace a recipe, registering every material it mentions
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    upsert_material(conn, &recipe.result_item)?;
    conn.execute(
        "INSERT OR REPLACE INTO recipes (result_item, result_quantity, crafting_time)
         VALUES (?1, ?2, ?3)",
        params![
            &recipe.result_item,
            recipe.result_quantity,
            recipe.crafting_time
        ],
    )
    .with_context(|| format!("failed to store recipe for '{}'", recipe.result_item))?;

    conn.execute(
        "DELETE FROM recipe_cells WHERE result_item = ?1",
        params![&recipe.result_item],
    )?;
    for (slot, cell) in recipe.cells.iter().enumerate() {
        let Some(cell) = cell else { continue };
        upsert_material(conn, &cell.material)?;
        conn.execute(
            "INSERT INTO recipe_cells (result_item, slot, material, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &recipe.result_item,
                slot as i64,
                &cell.material,
                cell.quantity
            ],
        )?;
    }
    Ok(())
}

/// Remove a recipe and its grid cells
pub fn remove_recipe(conn: &Connection, result_item: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM recipe_cells WHERE result_item = ?1",
        params![result_item],
    )?;
    conn.execute(
        "DELETE FROM recipes WHERE result_item = ?1",
        params![result_item],
    )?;
    Ok(())
}

/// Fetch the recipe producing `result_item`, cells in slot order
pub fn get_recipe(conn: &Connection, result_item: &str) -> Result<Option<Recipe>> {
    let header = conn
        .query_row(
            "SELECT result_quantity, crafting_time FROM recipes WHERE result_item = ?1",
            params![result_item],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, Option<f64>>(1)?)),
        )
        .optional()?;

    let Some((result_quantity, crafting_time)) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT slot, material, quantity FROM recipe_cells
         WHERE result_item = ?1 ORDER BY slot",
    )?;
    let rows = stmt.query_map(params![result_item], |row| {
        Ok((
            row.get::<_, usize>(0)?,
            RecipeCell {
                material: row.get(1)?,
                quantity: row.get(2)?,
            },
        ))
    })?;

    let mut cells: [Option<RecipeCell>; GRID_SLOTS] = std::array::from_fn(|_| None);
    for row in rows {
        let (slot, cell) = row?;
        if slot < GRID_SLOTS {
            cells[slot] = Some(cell);
        }
    }

    Ok(Some(Recipe {
        result_item: result_item.to_string(),
        result_quantity,
        cells,
        crafting_time,
    }))
}

/// List all known materials by name
pub fn list_materials(conn: &Connection) -> Result<Vec<Material>> {
    let mut stmt = conn.prepare("SELECT name FROM materials ORDER BY name")?;
    let rows = stmt.query_map([], |row| Ok(Material { name: row.get(0)? }))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all stored recipes
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare("SELECT result_item FROM recipes ORDER BY result_item")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }

    let mut results = Vec::new();
    for item in items {
        if let Some(recipe) = get_recipe(conn, &item)? {
            results.push(recipe);
        }
    }
    Ok(results)
}

/// The database is the calculator's recipe source.
impl RecipeSource for Connection {
    fn recipe_for(&self, material: &str) -> Result<Option<Recipe>> {
        get_recipe(self, material)
    }
}
