//! Static template table the mock generator picks from.

use crate::models::{NutritionInfo, Recipe, RecipeStep};

#[derive(Debug)]
pub struct RecipeTemplate {
    pub name: &'static str,
    /// Ingredient words that make this template a good match.
    pub keywords: &'static [&'static str],
    pub description: &'static str,
    pub base_ingredients: &'static [&'static str],
    /// Instruction text and optional timer in minutes.
    pub steps: &'static [(&'static str, Option<u32>)],
    pub prep_time: &'static str,
    pub cook_time: &'static str,
    pub servings: u32,
    pub category: &'static str,
    pub difficulty: &'static str,
    pub tags: &'static [&'static str],
    pub calories: u32,
    pub hero_image: &'static str,
}

pub static TEMPLATES: &[RecipeTemplate] = &[
    RecipeTemplate {
        name: "Stir-Fry",
        keywords: &["chicken", "beef", "tofu", "broccoli", "pepper", "rice", "soy", "noodle"],
        description: "A fast, high-heat stir-fry with a glossy soy and ginger sauce.",
        base_ingredients: &[
            "2 tbsp soy sauce",
            "1 tbsp grated ginger",
            "2 cloves garlic",
            "1 tbsp vegetable oil",
        ],
        steps: &[
            ("Slice everything into even, bite-sized pieces.", None),
            ("Heat the oil in a wok until it just starts to smoke.", Some(2)),
            ("Stir-fry the protein until browned, then set aside.", Some(5)),
            ("Stir-fry the vegetables with garlic and ginger.", Some(4)),
            ("Return everything to the wok, add soy sauce and toss to coat.", Some(1)),
        ],
        prep_time: "15 min",
        cook_time: "12 min",
        servings: 2,
        category: "Dinner",
        difficulty: "Easy",
        tags: &["Quick", "Dinner"],
        calories: 450,
        hero_image: "https://images.recipegen.app/stir-fry.jpg",
    },
    RecipeTemplate {
        name: "Pasta Primavera",
        keywords: &["pasta", "spaghetti", "tomato", "zucchini", "basil", "garlic", "parmesan"],
        description: "Tender pasta tossed with spring vegetables, olive oil and parmesan.",
        base_ingredients: &["200 g pasta", "2 tbsp olive oil", "30 g parmesan", "Salt and pepper"],
        steps: &[
            ("Bring a large pot of salted water to the boil.", None),
            ("Cook the pasta until al dente.", Some(10)),
            ("Meanwhile, sauté the vegetables in olive oil.", Some(6)),
            ("Toss the drained pasta with the vegetables and parmesan.", None),
        ],
        prep_time: "10 min",
        cook_time: "15 min",
        servings: 2,
        category: "Dinner",
        difficulty: "Easy",
        tags: &["Vegetarian", "Dinner"],
        calories: 520,
        hero_image: "https://images.recipegen.app/pasta-primavera.jpg",
    },
    RecipeTemplate {
        name: "Frittata",
        keywords: &["egg", "cheese", "spinach", "potato", "onion", "mushroom", "ham"],
        description: "A thick oven-finished omelette that works hot or cold.",
        base_ingredients: &["6 eggs", "60 ml milk", "1 tbsp butter", "Salt and pepper"],
        steps: &[
            ("Whisk the eggs with the milk and seasoning.", None),
            ("Soften the fillings in butter in an oven-safe pan.", Some(5)),
            ("Pour in the eggs and cook until the edges set.", Some(4)),
            ("Finish under the grill until puffed and golden.", Some(5)),
        ],
        prep_time: "10 min",
        cook_time: "15 min",
        servings: 4,
        category: "Breakfast",
        difficulty: "Easy",
        tags: &["Vegetarian", "Breakfast"],
        calories: 310,
        hero_image: "https://images.recipegen.app/frittata.jpg",
    },
    RecipeTemplate {
        name: "Hearty Soup",
        keywords: &["carrot", "potato", "onion", "celery", "bean", "lentil", "leek"],
        description: "A slow-simmered vegetable soup thick enough to eat with a fork.",
        base_ingredients: &["1 litre vegetable stock", "1 onion", "2 tbsp olive oil", "1 bay leaf"],
        steps: &[
            ("Dice the vegetables.", None),
            ("Sweat the onion in olive oil until translucent.", Some(6)),
            ("Add the remaining vegetables, stock and bay leaf.", None),
            ("Simmer until everything is tender.", Some(30)),
            ("Season and blend half of the soup for body.", None),
        ],
        prep_time: "15 min",
        cook_time: "40 min",
        servings: 4,
        category: "Lunch",
        difficulty: "Easy",
        tags: &["Vegan", "Comfort"],
        calories: 280,
        hero_image: "https://images.recipegen.app/hearty-soup.jpg",
    },
    RecipeTemplate {
        name: "Garden Salad",
        keywords: &["lettuce", "cucumber", "tomato", "avocado", "spinach", "radish"],
        description: "Crisp greens and vegetables with a bright lemon vinaigrette.",
        base_ingredients: &["3 tbsp olive oil", "1 tbsp lemon juice", "1 tsp mustard", "Salt"],
        steps: &[
            ("Wash and dry the greens.", None),
            ("Whisk the oil, lemon juice and mustard together.", None),
            ("Slice the vegetables and toss everything with the dressing.", None),
        ],
        prep_time: "10 min",
        cook_time: "0 min",
        servings: 2,
        category: "Lunch",
        difficulty: "Easy",
        tags: &["Vegan", "Quick"],
        calories: 190,
        hero_image: "https://images.recipegen.app/garden-salad.jpg",
    },
    RecipeTemplate {
        name: "Tacos",
        keywords: &["tortilla", "beef", "chicken", "bean", "corn", "avocado", "salsa"],
        description: "Warm tortillas loaded with a smoky spiced filling.",
        base_ingredients: &["8 small tortillas", "1 tsp cumin", "1 tsp smoked paprika", "1 lime"],
        steps: &[
            ("Cook the filling with cumin and paprika.", Some(10)),
            ("Warm the tortillas in a dry pan.", Some(2)),
            ("Fill, top and finish with a squeeze of lime.", None),
        ],
        prep_time: "15 min",
        cook_time: "12 min",
        servings: 4,
        category: "Dinner",
        difficulty: "Easy",
        tags: &["Dinner", "Family"],
        calories: 480,
        hero_image: "https://images.recipegen.app/tacos.jpg",
    },
    RecipeTemplate {
        name: "Coconut Curry",
        keywords: &["chickpea", "coconut", "curry", "tofu", "rice", "sweet potato", "spinach"],
        description: "A creamy, mildly spiced curry built on coconut milk.",
        base_ingredients: &[
            "400 ml coconut milk",
            "2 tbsp curry paste",
            "1 onion",
            "Cooked rice to serve",
        ],
        steps: &[
            ("Fry the onion until soft.", Some(5)),
            ("Stir in the curry paste and cook until fragrant.", Some(1)),
            ("Add the main ingredients and coconut milk.", None),
            ("Simmer until thickened.", Some(20)),
        ],
        prep_time: "10 min",
        cook_time: "30 min",
        servings: 4,
        category: "Dinner",
        difficulty: "Medium",
        tags: &["Vegan", "Dinner"],
        calories: 540,
        hero_image: "https://images.recipegen.app/coconut-curry.jpg",
    },
];

impl RecipeTemplate {
    /// Number of user ingredients that mention one of this template's
    /// keywords.
    pub fn match_score(&self, ingredients: &[String]) -> usize {
        ingredients
            .iter()
            .filter(|ingredient| {
                let ingredient = ingredient.to_lowercase();
                self.keywords.iter().any(|keyword| ingredient.contains(keyword))
            })
            .count()
    }

    /// A template satisfies a dietary preference when it carries it as a
    /// tag. Vegan dishes also count as vegetarian.
    pub fn satisfies(&self, preference: &str) -> bool {
        let preference = preference.trim().to_lowercase();
        self.tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            tag == preference || (preference == "vegetarian" && tag == "vegan")
        })
    }

    /// Builds a recipe from this template around the user's ingredients.
    pub fn instantiate(&self, ingredients: &[String], dietary_preference: Option<&str>) -> Recipe {
        let mut recipe = Recipe::new(self.title_for(ingredients));
        recipe.description = self.description.to_string();
        recipe.servings = self.servings;
        recipe.prep_time = self.prep_time.to_string();
        recipe.cook_time = self.cook_time.to_string();
        recipe.category = Some(self.category.to_string());
        recipe.difficulty = Some(self.difficulty.to_string());
        recipe.hero_image = Some(self.hero_image.to_string());
        recipe.nutrition_info = Some(NutritionInfo {
            calories: Some(self.calories),
            ..NutritionInfo::default()
        });

        recipe.ingredients = self.base_ingredients.iter().map(|item| item.to_string()).collect();
        for ingredient in ingredients {
            let folded = ingredient.to_lowercase();
            let covered = recipe
                .ingredients
                .iter()
                .any(|existing| existing.to_lowercase().contains(&folded));
            if !covered {
                recipe.ingredients.push(ingredient.clone());
            }
        }

        recipe.steps = self
            .steps
            .iter()
            .map(|(instruction, timer)| RecipeStep {
                instruction: instruction.to_string(),
                image_url: None,
                timer_minutes: *timer,
            })
            .collect();

        for tag in self.tags {
            recipe.add_tag(tag);
        }
        if let Some(preference) = dietary_preference {
            recipe.add_tag(&title_case(preference));
        }

        recipe
    }

    fn title_for(&self, ingredients: &[String]) -> String {
        match ingredients.first() {
            Some(lead) if !self.name.to_lowercase().contains(&lead.to_lowercase()) => {
                format!("{} {}", title_case(lead), self.name)
            }
            _ => self.name.to_string(),
        }
    }
}

/// Templates worth choosing from: the best keyword matches among those that
/// honour the dietary preference. Falls back to every eligible template when
/// nothing matches, and ignores the preference when no template honours it.
pub fn select_candidates<'a>(
    templates: &'a [RecipeTemplate],
    ingredients: &[String],
    dietary_preference: Option<&str>,
) -> Vec<&'a RecipeTemplate> {
    let mut eligible: Vec<&RecipeTemplate> = match dietary_preference {
        Some(preference) => templates.iter().filter(|t| t.satisfies(preference)).collect(),
        None => Vec::new(),
    };
    if eligible.is_empty() {
        eligible = templates.iter().collect();
    }

    let best = eligible
        .iter()
        .map(|template| template.match_score(ingredients))
        .max()
        .unwrap_or(0);
    if best == 0 {
        return eligible;
    }

    eligible
        .into_iter()
        .filter(|template| template.match_score(ingredients) == best)
        .collect()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
