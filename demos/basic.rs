//! Basic example: resolving attributes on a character sheet
//!
//! This example demonstrates:
//! - Loading scalable templates from TOML
//! - Summing modifiers from local changes, items and effects
//! - Toggling an effect
//! - Resolving size and size-scaled damage

use sheetcalc::*;

fn main() -> Result<(), ContentError> {
    // Unarmed damage depends on the wielder's size
    let config = EngineConfig::from_toml_str(
        r#"
        [scalable_templates.unarmedDamageScalable."1d4"]
        Medium = [{ key = "unarmedDamage", value = "1d4" }]
        Large = [{ key = "unarmedDamage", value = "1d6" }]
        "#,
    )?;
    config.validate()?;
    let mut resolver = AttributeResolver::new(config);

    println!("Building the sheet:");
    let mut hero = Actor::new("a1", "Kel", "character")
        .with_change(Change::new("size", "Medium"))
        .with_change(Change::new("speed", 6))
        .with_change(Change::new("unarmedDamageScalable", "1d4"))
        .with_item(Item::new("f1", "Running Attack", "feat").with_change(Change::new("speed", 1)))
        .with_effect(Effect::new("e1", "Haste").with_change(Change::new("speed", 2)));
    println!("  - Base speed: 6");
    println!("  - Feat bonus: +1");
    println!("  - Haste effect: +2");

    println!("\n=== Speed ===");
    println!("With haste: {}", speed(&mut resolver, &hero));

    hero.set_effect_disabled("e1", true);
    println!("Haste ended: {}", speed(&mut resolver, &hero));

    print_size_and_damage(&mut resolver, &hero);

    println!("\nGrowing one size step...");
    hero.add_change(Change::new("sizeBonus", 1));
    print_size_and_damage(&mut resolver, &hero);

    Ok(())
}

fn speed(resolver: &mut AttributeResolver, hero: &Actor) -> f64 {
    let query = Query::new().entity(hero).key("speed").reduce(Reduce::Sum);
    resolver.resolve(&query).as_number().unwrap_or(0.0)
}

fn print_size_and_damage(resolver: &mut AttributeResolver, hero: &Actor) {
    let size = resolver.resolve_size_name(Target::primary(hero));
    let damage = Query::new().entity(hero).key("unarmedDamage").reduce(Reduce::Values);
    let dice: Vec<String> = resolver
        .resolve(&damage)
        .as_values()
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect();

    println!("\n=== Size ===");
    println!("Size: {}", size.as_deref().unwrap_or("unknown"));
    println!("Unarmed damage: {}", dice.join(", "));
}
