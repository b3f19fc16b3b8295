//! Crafting Cost Calculator
//!
//! Computes the recursive material cost of crafting an item from
//! user-defined 3x3 grid recipes, reusing spare units left over from
//! whole-batch crafting.

mod calculator;
mod db;
mod models;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::models::{CostNode, GRID_SLOTS, Recipe, RecipeCell};

#[derive(Parser)]
#[command(name = "craft-calculator")]
#[command(about = "Crafting cost calculator for 3x3 grid recipes")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "recipes.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Register a material by name
    AddMaterial {
        /// Material name
        name: String,
    },

    /// Remove a material and any recipe that produces it
    RemoveMaterial {
        /// Material name
        name: String,
    },

    /// Add or replace the recipe for an item
    AddRecipe {
        /// Item the recipe produces
        result: String,

        /// Units produced per craft
        #[arg(long, default_value = "1")]
        makes: u64,

        /// Grid cell as SLOT:MATERIAL:QUANTITY, slot 0-8 row-major
        #[arg(long = "cell", value_name = "SLOT:MATERIAL:QTY")]
        cells: Vec<String>,

        /// Seconds per craft operation
        #[arg(long)]
        time: Option<f64>,
    },

    /// Remove the recipe for an item
    RemoveRecipe {
        /// Item whose recipe to remove
        result: String,
    },

    /// List all known materials
    ListMaterials,

    /// List all stored recipes
    ListRecipes,

    /// Show the recipe for an item
    Recipe {
        /// Item whose recipe to show
        result: String,
    },

    /// Calculate the crafting cost for an item
    Calc {
        /// Material to craft
        material: String,

        /// How many units to craft
        #[arg(short, long, default_value = "1")]
        quantity: u64,

        /// Report only aggregated raw materials instead of the full tree
        #[arg(long)]
        raw: bool,
    },

    /// Load a sample recipe set for trying the tool
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::AddMaterial { name } => {
            db::upsert_material(&conn, &name)?;
            println!("Added material '{}'", name);
        }

        Commands::RemoveMaterial { name } => {
            db::remove_material(&conn, &name)?;
            println!("Removed material '{}'", name);
        }

        Commands::AddRecipe {
            result,
            makes,
            cells,
            time,
        } => {
            if makes == 0 {
                bail!("a recipe must produce at least 1 unit per craft");
            }
            let recipe = build_recipe(&result, makes, &cells, time)?;
            db::upsert_recipe(&conn, &recipe)?;
            println!("Stored recipe for '{}' (makes {})", result, makes);
        }

        Commands::RemoveRecipe { result } => {
            db::remove_recipe(&conn, &result)?;
            println!("Removed recipe for '{}'", result);
        }

        Commands::ListMaterials => {
            let materials = db::list_materials(&conn)?;
            if materials.is_empty() {
                println!("No materials in database. Run 'add-recipe' or 'load-sample' first.");
            } else {
                for m in materials {
                    let tag = match db::get_recipe(&conn, &m.name)? {
                        Some(_) => "crafted",
                        None => "raw",
                    };
                    println!("{:<30} {}", m.name, tag);
                }
            }
        }

        Commands::ListRecipes => {
            let recipes = db::list_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'add-recipe' or 'load-sample' first.");
            } else {
                println!("{:<20} {:>6} {:>8}  Inputs", "Result", "Makes", "Time");
                println!("{}", "-".repeat(60));
                for r in recipes {
                    println!(
                        "{:<20} {:>6} {:>7}s  {}",
                        r.result_item,
                        r.result_quantity,
                        r.time_per_batch(),
                        describe_inputs(&r)
                    );
                }
            }
        }

        Commands::Recipe { result } => match db::get_recipe(&conn, &result)? {
            Some(recipe) => print_recipe(&recipe),
            None => println!("No recipe for '{}' (raw material?)", result),
        },

        Commands::Calc {
            material,
            quantity,
            raw,
        } => {
            if quantity == 0 {
                bail!("quantity must be at least 1");
            }
            let node = calculator::resolve_cost(&conn, &material, quantity, raw)?;

            match &node {
                CostNode::Leaf { .. } => {
                    println!(
                        "'{}' has no recipe; gather {}x {} directly.",
                        material, quantity, material
                    );
                }
                CostNode::Crafted { .. } if raw => {
                    print_raw_cost(&node, &material, quantity);
                }
                CostNode::Crafted { .. } => {
                    println!("Cost tree:\n");
                    print!("{}", calculator::format_cost_tree(&node, 0));
                    println!();
                    println!("{}", calculator::summarize_cost(&node, &material, quantity));
                }
            }
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

/// Assemble a recipe from `SLOT:MATERIAL:QTY` cell specs
fn build_recipe(result: &str, makes: u64, cells: &[String], time: Option<f64>) -> Result<Recipe> {
    let mut grid: [Option<RecipeCell>; GRID_SLOTS] = std::array::from_fn(|_| None);
    for spec in cells {
        let (slot, cell) = parse_cell(spec)?;
        if grid[slot].is_some() {
            bail!("grid slot {} specified twice", slot);
        }
        grid[slot] = Some(cell);
    }
    Ok(Recipe {
        result_item: result.to_string(),
        result_quantity: makes,
        cells: grid,
        crafting_time: time,
    })
}

/// Parse one `SLOT:MATERIAL:QTY` cell spec; quantity defaults to 1
fn parse_cell(spec: &str) -> Result<(usize, RecipeCell)> {
    let mut parts = spec.splitn(3, ':');
    let slot: usize = match parts.next() {
        Some(s) => s
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid slot in cell spec '{}'", spec))?,
        None => bail!("empty cell spec"),
    };
    if slot >= GRID_SLOTS {
        bail!("slot must be 0-8, got {} in '{}'", slot, spec);
    }
    let Some(material) = parts.next().filter(|m| !m.is_empty()) else {
        bail!("missing material in cell spec '{}'", spec);
    };
    let quantity: u64 = match parts.next() {
        Some(q) => q
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid quantity in cell spec '{}'", spec))?,
        None => 1,
    };
    if quantity == 0 {
        bail!("cell quantity must be at least 1 in '{}'", spec);
    }
    Ok((
        slot,
        RecipeCell {
            material: material.to_string(),
            quantity,
        },
    ))
}

/// Print a recipe as its 3x3 grid plus metadata
fn print_recipe(recipe: &Recipe) {
    println!(
        "Recipe: {} (makes {}, {} per craft)",
        recipe.result_item,
        recipe.result_quantity,
        calculator::format_crafting_time(recipe.time_per_batch())
    );
    for row in 0..3 {
        let mut line = String::new();
        for col in 0..3 {
            let cell = &recipe.cells[row * 3 + col];
            let text = match cell {
                Some(c) => format!("{}x {}", c.quantity, c.material),
                None => "-".to_string(),
            };
            line.push_str(&format!("{:<20}", text));
        }
        println!("  {}", line.trim_end());
    }
}

fn describe_inputs(recipe: &Recipe) -> String {
    let inputs: Vec<String> = recipe
        .occupied_cells()
        .map(|c| format!("{}x {}", c.quantity, c.material))
        .collect();
    if inputs.is_empty() {
        "(none)".to_string()
    } else {
        inputs.join(", ")
    }
}

fn print_raw_cost(node: &CostNode, material: &str, quantity: u64) {
    let CostNode::Crafted {
        crafting_time,
        materials,
        ..
    } = node
    else {
        return;
    };
    println!("Raw cost for {}x {}:", quantity, material);
    if materials.is_empty() {
        println!("  (no raw inputs)");
    }
    for input in materials {
        if let CostNode::Leaf { material, quantity } = input {
            println!("  {}x {}", quantity, material);
        }
    }
    println!(
        "Total crafting time: {}",
        calculator::format_crafting_time(*crafting_time)
    );
}

/// Load a small Minecraft-flavoured recipe set for testing without manual
/// data entry
fn load_sample_data(conn: &Connection) -> Result<()> {
    let samples = [
        ("plank", 4, vec![(4, "log", 1)], None),
        ("stick", 4, vec![(1, "plank", 1), (4, "plank", 1)], None),
        ("torch", 4, vec![(1, "coal", 1), (4, "stick", 1)], None),
        (
            "crafting_table",
            1,
            vec![
                (0, "plank", 1),
                (1, "plank", 1),
                (3, "plank", 1),
                (4, "plank", 1),
            ],
            None,
        ),
        (
            "chest",
            1,
            vec![
                (0, "plank", 1),
                (1, "plank", 1),
                (2, "plank", 1),
                (3, "plank", 1),
                (5, "plank", 1),
                (6, "plank", 1),
                (7, "plank", 1),
                (8, "plank", 1),
            ],
            None,
        ),
        ("iron_ingot", 1, vec![(4, "raw_iron", 1)], Some(10.0)),
        (
            "ladder",
            3,
            vec![
                (0, "stick", 1),
                (2, "stick", 1),
                (3, "stick", 1),
                (4, "stick", 1),
                (5, "stick", 1),
                (6, "stick", 1),
                (8, "stick", 1),
            ],
            None,
        ),
    ];

    let count = samples.len();
    for (result, makes, cells, time) in samples {
        let mut grid: [Option<RecipeCell>; GRID_SLOTS] = std::array::from_fn(|_| None);
        for (slot, material, quantity) in cells {
            grid[slot] = Some(RecipeCell {
                material: material.to_string(),
                quantity,
            });
        }
        db::upsert_recipe(
            conn,
            &Recipe {
                result_item: result.to_string(),
                result_quantity: makes,
                cells: grid,
                crafting_time: time,
            },
        )?;
    }

    println!("Loaded {} sample recipes", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_spec_parses_slot_material_and_quantity() {
        let (slot, cell) = parse_cell("4:log:2").unwrap();
        assert_eq!(slot, 4);
        assert_eq!(cell.material, "log");
        assert_eq!(cell.quantity, 2);
    }

    #[test]
    fn cell_spec_quantity_defaults_to_one() {
        let (_, cell) = parse_cell("0:plank").unwrap();
        assert_eq!(cell.quantity, 1);
    }

    #[test]
    fn bad_cell_specs_are_rejected() {
        assert!(parse_cell("9:log:1").is_err());
        assert!(parse_cell("x:log:1").is_err());
        assert!(parse_cell("0::1").is_err());
        assert!(parse_cell("0:log:0").is_err());
        assert!(parse_cell("0:log:x").is_err());
    }

    #[test]
    fn duplicate_slots_are_rejected() {
        let cells = vec!["0:log:1".to_string(), "0:coal:1".to_string()];
        assert!(build_recipe("torch", 1, &cells, None).is_err());
    }

    #[test]
    fn build_recipe_places_cells() {
        let cells = vec!["4:log:1".to_string()];
        let recipe = build_recipe("plank", 4, &cells, None).unwrap();
        assert_eq!(recipe.result_quantity, 4);
        assert_eq!(
            recipe.cells[4],
            Some(RecipeCell {
                material: "log".to_string(),
                quantity: 1,
            })
        );
        assert!(recipe.cells[0].is_none());
    }
}
