// Menu - items offered on the New Order page with their default prices.
// Configured as an array so a user config replaces the whole list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Default for Menu {
    fn default() -> Self {
        Menu::from_pairs(&[
            ("Espresso", 120.0),
            ("Americano", 120.0),
            ("Latte", 150.0),
            ("Cappuccino", 150.0),
            ("Spanish Latte", 170.0),
            ("Cold Brew", 160.0),
            ("Pourover", 180.0),
            ("Cookie", 80.0),
        ])
    }
}

impl Menu {
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Menu {
            items: pairs
                .iter()
                .map(|(name, price)| MenuItem {
                    name: name.to_string(),
                    price: *price,
                })
                .collect(),
        }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.items.iter().map(|i| (i.name.as_str(), i.price))
    }

    /// Find an item by name, ignoring case and surrounding whitespace
    pub fn find(&self, name: &str) -> Option<&MenuItem> {
        let wanted = name.trim();
        self.items
            .iter()
            .find(|i| i.name == wanted)
            .or_else(|| self.items.iter().find(|i| i.name.eq_ignore_ascii_case(wanted)))
    }

    /// Default price of an item
    pub fn price(&self, name: &str) -> Option<f64> {
        self.find(name).map(|i| i.price)
    }

    /// Add an item, or replace the price of an existing one
    pub fn insert(&mut self, name: &str, price: f64) {
        match self.items.iter_mut().find(|i| i.name == name) {
            Some(item) => item.price = price,
            None => self.items.push(MenuItem {
                name: name.to_string(),
                price,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_menu_keeps_order() {
        let menu = Menu::default();
        let names: Vec<&str> = menu.iter().map(|(n, _)| n).collect();

        assert_eq!(names.first(), Some(&"Espresso"));
        assert_eq!(names.last(), Some(&"Cookie"));
        assert_eq!(menu.len(), 8);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let menu = Menu::default();

        assert_eq!(menu.price("cold brew"), Some(160.0));
        assert_eq!(menu.price(" Spanish Latte "), Some(170.0));
        assert_eq!(menu.price("Matcha"), None);
    }

    #[test]
    fn test_insert_replaces_price() {
        let mut menu = Menu::default();
        menu.insert("Cookie", 95.0);
        menu.insert("Matcha", 190.0);

        assert_eq!(menu.price("Cookie"), Some(95.0));
        assert_eq!(menu.len(), 9);
    }

    #[test]
    fn test_deserializes_from_array() {
        let json = r#"[{"name": "Mocha", "price": 165}]"#;
        let menu: Menu = serde_json::from_str(json).unwrap();

        assert_eq!(menu.items(), &[MenuItem { name: "Mocha".to_string(), price: 165.0 }]);
    }
}
