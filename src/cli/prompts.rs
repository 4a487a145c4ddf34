//! Interactive prompts used by the menu loop.

use crate::error::Result;
use crate::map::{FilterCriteria, FilterOptions, ALL};
use crate::models::AqiCategory;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{FuzzySelect, Input, MultiSelect};

/// Free-text input. Empty input is rejected by `dialoguer` itself.
pub fn prompt_text(prompt: &str) -> Result<String> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Optional free-text input; returns `None` when left blank.
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Fuzzy pick from `values`, with `All` offered first.
fn prompt_dimension(prompt: &str, values: &[String]) -> Result<String> {
    let mut items = vec![ALL.to_string()];
    items.extend(values.iter().cloned());
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()?
        .unwrap_or(0);
    Ok(items.swap_remove(selection))
}

/// Walks the user through every filter dimension.
pub fn prompt_filter(options: &FilterOptions) -> Result<FilterCriteria> {
    let continent = prompt_dimension("Continent", &options.continents)?;
    let country = prompt_dimension("Country", &options.countries)?;
    let city = prompt_dimension("City", &options.cities)?;

    let labels: Vec<&str> = AqiCategory::ALL.iter().map(|c| c.label()).collect();
    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("AQI categories (space to toggle, none = all)")
        .items(&labels)
        .interact_opt()?
        .unwrap_or_default();

    let search = prompt_optional("Search city or country (blank to skip)")?;
    Ok(FilterCriteria::region(&continent, &country, &city)
        .with_search(search.as_deref().unwrap_or(""))
        .with_categories(picked.into_iter().map(|i| labels[i])))
}
