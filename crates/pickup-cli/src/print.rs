//! Plain-text rendering of flow state.

use pickup_core::{PickupLine, RATING_SCALE};
use pickup_flows::{GeneratorState, HistoryState, SettingsState, StatsView};

pub fn token(token: Option<&str>) {
    match token {
        Some(token) => println!("export PICKUP_API_TOKEN={}", token),
        None => println!("No token issued"),
    }
}

pub fn stars(rating: u8) -> String {
    RATING_SCALE
        .iter()
        .map(|n| if *n <= rating { '★' } else { '☆' })
        .collect()
}

pub fn generated(state: &GeneratorState) {
    let Some(line) = &state.line else {
        return;
    };
    let [style, dirtiness] = line.chips();
    println!("{}", line.text);
    println!(
        "  [{}] [{}] id: {}",
        style,
        dirtiness,
        state.history_id.as_deref().unwrap_or("-")
    );
}

pub fn history(state: &HistoryState) {
    let visible = state.visible();
    if visible.is_empty() {
        println!("No pickup lines found");
    }
    for record in visible {
        record_line(record);
    }
    println!("Page {} of {}", state.page, state.pages.max(1));
}

fn record_line(record: &PickupLine) {
    let mut flags = Vec::new();
    if record.used {
        flags.push("used");
    }
    // Only shown for used lines, even if the server kept an older value.
    if record.offers_success_toggle() && record.is_successful() {
        flags.push("success");
    }

    println!("{}  {}", record.id, record.pickup_line);
    println!(
        "    for: {} | {} | Dirtiness: {}/10 | {} {}",
        record.person_description,
        record.style.label(),
        record.dirtiness_level,
        stars(record.stars()),
        flags.join(", ")
    );
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("    notes: {}", notes);
    }
}

pub fn stats(view: &StatsView) {
    println!("Total generated: {}", view.total_generated);
    println!("Lines used:      {}", view.total_used);
    println!("Success rate:    {}", view.success_rate);
    println!("Average rating:  {}", view.average_rating);

    if !view.styles.is_empty() {
        println!("\nStyles");
        for slice in &view.styles {
            println!("  {:<10} {}", slice.label, slice.value);
        }
    }
    if !view.dirtiness.is_empty() {
        println!("\nDirtiness");
        for bar in &view.dirtiness {
            println!("  {:<10} {}", bar.label, "#".repeat(bar.count as usize));
        }
    }
    if !view.success.is_empty() {
        println!("\nSuccess by style");
        for row in &view.success {
            println!("  {:<10} {}% of {}", row.style, row.rate, row.total);
        }
    }
    if !view.activity.is_empty() {
        println!("\nLast 7 days");
        for point in &view.activity {
            println!("  {:<10} {}", point.label, point.count);
        }
    }
}

pub fn settings(state: &SettingsState) {
    let settings = &state.settings;
    let model = state
        .selected_model()
        .map(|model| format!("{} ({})", model.name, model.id))
        .unwrap_or_else(|| settings.preferred_model.clone());

    println!("Model:             {}", model);
    println!("Temperature:       {:.1}", settings.temperature);
    println!("Max tokens:        {}", settings.max_tokens);
    println!("Default dirtiness: {}/10", settings.default_dirtiness_level);
    println!("Default style:     {}", settings.preferred_style.label());
    println!("Emojis:            {}", if settings.include_emojis { "on" } else { "off" });
    match settings.template() {
        Some(template) => println!("Prompt template:   {}", template),
        None => println!("Prompt template:   (built-in)"),
    }
    if let Some(updated_at) = &settings.updated_at {
        println!("Updated:           {}", updated_at);
    }
}

pub fn models(state: &SettingsState) {
    if state.models.is_empty() {
        println!("No models available");
    }
    for model in &state.models {
        let marker = if model.id == state.settings.preferred_model {
            '*'
        } else {
            ' '
        };
        println!("{} {:<45} {}", marker, model.id, model.name);
        if !model.description.is_empty() {
            println!("    {}", model.description);
        }
    }
}
