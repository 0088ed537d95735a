//! Built-in exercise catalog.
//!
//! Five bodyweight exercises per category. The recommender draws from these
//! pools; manual routines may also use any custom name.

use crate::types::Category;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A catalog entry
#[derive(Clone, Debug)]
pub struct Exercise {
    pub name: &'static str,
    pub category: Category,
}

/// Exercise pools keyed by category
#[derive(Clone, Debug)]
pub struct Catalog {
    pools: HashMap<Category, Vec<&'static str>>,
}

/// Cached default catalog, built once and shared
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
pub fn build_default_catalog() -> Catalog {
    let mut pools = HashMap::new();

    pools.insert(
        Category::UpperBody,
        vec!["Push-up", "Arm Walk", "Plank", "Crunch", "Pike Shoulder Press"],
    );
    pools.insert(
        Category::LowerBody,
        vec!["Squat", "Lunge", "Jump Squat", "Calf Raise", "Donkey Kickback"],
    );
    pools.insert(
        Category::FullBody,
        vec![
            "Slow Burpee",
            "Jumping Jack",
            "Mountain Climber",
            "Plank Jack",
            "Superman",
        ],
    );

    Catalog { pools }
}

impl Catalog {
    /// Exercises of one category in catalog order
    pub fn pool(&self, category: Category) -> &[&'static str] {
        self.pools.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every exercise, grouped in category cycle order
    pub fn exercises(&self) -> Vec<Exercise> {
        Category::CYCLE
            .iter()
            .flat_map(|&category| {
                self.pool(category)
                    .iter()
                    .map(move |&name| Exercise { name, category })
            })
            .collect()
    }

    /// Category of a catalog exercise (case-insensitive); custom names have none
    pub fn category_of(&self, name: &str) -> Option<Category> {
        let needle = name.trim();
        self.exercises()
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(needle))
            .map(|e| e.category)
    }
}
