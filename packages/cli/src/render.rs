//! Text-table rendering for datasets.

use careboard_models::{Category, ChartRow};

/// Prints the disease catalog as a numbered list.
pub fn catalog(names: &[String]) {
    println!("{:<6} DISEASE", "#");
    println!("{}", "-".repeat(40));
    for (position, name) in names.iter().enumerate() {
        println!("{:<6} {name}", position + 1);
    }
    println!();
    println!("{} disease(s)", names.len());
}

/// Prints one dataset as an aligned table.
///
/// Fixed-column categories always print their declared columns; open
/// categories derive columns from the rows in first-encounter order.
/// Absent counts print as `-`.
pub fn dataset(title: &str, category: Category, rows: &[ChartRow]) {
    println!("{title}");

    if rows.is_empty() {
        println!("(no data)");
        println!();
        return;
    }

    let columns = column_set(category, rows);
    let key_header = category.key_column().as_str().to_uppercase();
    let key_width = rows
        .iter()
        .map(|row| row.key.len())
        .fold(key_header.len(), usize::max);

    print!("{key_header:<key_width$}");
    for column in &columns {
        print!("  {:>12}", column.to_uppercase());
    }
    println!();
    println!("{}", "-".repeat(key_width + columns.len() * 14));

    for row in rows {
        print!("{:<key_width$}", row.key);
        for column in &columns {
            let cell = row
                .get(column)
                .map_or_else(|| "-".to_string(), ToString::to_string);
            print!("  {cell:>12}");
        }
        println!();
    }
    println!();
}

fn column_set(category: Category, rows: &[ChartRow]) -> Vec<String> {
    if category.has_fixed_columns() {
        return category.columns().iter().map(|c| (*c).to_string()).collect();
    }

    let mut columns = Vec::new();
    for row in rows {
        for (series, _) in &row.cells {
            if !columns.contains(series) {
                columns.push(series.clone());
            }
        }
    }
    columns
}
