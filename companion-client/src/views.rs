//! Read-only accessors over a graph snapshot's well-known keys, supplemented
//! from `mrpippy.data.{player,inventory}`. These never touch the network or
//! the RPC layer; they tolerate missing or mistyped keys by returning
//! `None` rather than panicking, since a partially-populated graph is the
//! normal state right after a connection opens.

use companion_types::Value;

/// A view over the root object's `"PlayerInfo"` and related top-level keys.
pub struct PlayerStatus<'a> {
    root: &'a Value,
}

impl<'a> PlayerStatus<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    fn player_info(&self) -> Option<&Value> {
        self.root.as_object()?.get("PlayerInfo")
    }

    pub fn name(&self) -> Option<&str> {
        self.player_info()?.as_object()?.get("PlayerName")?.as_str()
    }

    pub fn hp(&self) -> Option<f32> {
        self.player_info()?.as_object()?.get("CurrHP")?.as_f32()
    }

    pub fn max_hp(&self) -> Option<f32> {
        self.player_info()?.as_object()?.get("MaxHP")?.as_f32()
    }

    pub fn level(&self) -> Option<f32> {
        let info = self.player_info()?.as_object()?;
        let level = info.get("XPLevel")?.as_f32()?;
        let progress = info.get("XPProgressPct")?.as_f32()?;
        Some(level + progress)
    }

    /// `None` when the player is in no special state (matches the original
    /// flag-priority list; the first matching flag wins).
    pub fn status(&self) -> Option<&'static str> {
        const FLAGS: &[(&str, &str)] = &[
            ("IsDataUnavailable", "data unavailable"),
            ("IsPlayerDead", "dead"),
            ("IsLoading", "loading"),
            ("IsInAutoVanity", "in auto vanity"),
            ("IsMenuOpen", "in menu"),
            ("IsPipboyNotEquipped", "no pipboy"),
            ("IsPlayerPipboyLocked", "pipboy locked"),
            ("IsPlayerMovementLocked", "movement locked"),
            ("IsInVats", "in vats"),
            ("IsInVatsPlayback", "in vats playback"),
            ("IsPlayerInDialogue", "in dialogue"),
            ("IsInAnimation", "in animation"),
        ];
        let status = self.root.as_object()?.get("Status")?.as_object()?;
        FLAGS
            .iter()
            .find(|(key, _)| status.get(*key).and_then(Value::as_bool).unwrap_or(false))
            .map(|(_, description)| *description)
    }

    pub fn locked(&self) -> bool {
        self.status().is_some()
    }
}

/// A view over the root object's `"Inventory"` key.
pub struct Inventory<'a> {
    root: &'a Value,
}

/// One entry from an inventory listing.
pub struct InventoryItem<'a> {
    value: &'a Value,
}

impl<'a> Inventory<'a> {
    pub fn new(root: &'a Value) -> Option<Self> {
        root.as_object()?.get("Inventory")?;
        Some(Self { root })
    }

    fn inventory(&self) -> &Value {
        self.root.as_object().unwrap().get("Inventory").unwrap()
    }

    /// All items across the well-known item-type buckets.
    pub fn items(&self) -> Vec<InventoryItem<'a>> {
        const ITEM_TYPES: &[&str] = &["29", "30", "35", "43", "44", "47", "48", "50"];
        ITEM_TYPES
            .iter()
            .filter_map(|key| self.inventory().as_object()?.get(*key)?.as_array())
            .flatten()
            .map(|value| InventoryItem { value })
            .collect()
    }

    pub fn weapon(&self) -> Option<InventoryItem<'a>> {
        self.items().into_iter().find(|item| item.equip_state() == Some(4))
    }

    pub fn wearing(&self) -> Vec<InventoryItem<'a>> {
        self.items().into_iter().filter(|item| item.equip_state() == Some(1)).collect()
    }
}

impl<'a> InventoryItem<'a> {
    pub fn name(&self) -> Option<&str> {
        self.value.as_object()?.get("text")?.as_str()
    }

    pub fn count(&self) -> Option<i64> {
        self.value.as_object()?.get("count")?.as_i64()
    }

    fn equip_state(&self) -> Option<i64> {
        self.value.as_object()?.get("equipState")?.as_i64()
    }

    /// `None` when the item has no favoritable state at all.
    pub fn favorite(&self) -> Option<bool> {
        let can_favorite = self.value.as_object()?.get("canFavorite")?.as_bool()?;
        if !can_favorite {
            return None;
        }
        Some(self.value.as_object()?.get("favorite")?.as_i64()? >= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn player_status_reads_through_nested_objects() {
        let root = obj(vec![(
            "PlayerInfo",
            obj(vec![
                ("PlayerName", Value::String("Vault Dweller".to_string())),
                ("CurrHP", Value::Int32(95)),
                ("MaxHP", Value::Int32(100)),
                ("XPLevel", Value::Int32(12)),
                ("XPProgressPct", Value::Float(0.5)),
            ]),
        )]);
        let status = PlayerStatus::new(&root);
        assert_eq!(status.name(), Some("Vault Dweller"));
        assert_eq!(status.hp(), Some(95.0));
        assert_eq!(status.level(), Some(12.5));
    }

    #[test]
    fn player_status_is_none_when_no_flag_is_set() {
        let root = obj(vec![("Status", Value::Object(BTreeMap::new()))]);
        let status = PlayerStatus::new(&root);
        assert_eq!(status.status(), None);
        assert!(!status.locked());
    }

    #[test]
    fn player_status_picks_the_first_matching_flag_in_priority_order() {
        let mut flags = BTreeMap::new();
        flags.insert("IsPlayerDead".to_string(), Value::Bool(true));
        flags.insert("IsLoading".to_string(), Value::Bool(true));
        let root = obj(vec![("Status", Value::Object(flags))]);
        let status = PlayerStatus::new(&root);
        assert_eq!(status.status(), Some("dead"));
        assert!(status.locked());
    }

    #[test]
    fn missing_player_info_resolves_to_none_rather_than_panicking() {
        let root = obj(vec![]);
        let status = PlayerStatus::new(&root);
        assert_eq!(status.name(), None);
        assert_eq!(status.hp(), None);
    }

    #[test]
    fn inventory_collects_items_across_type_buckets() {
        let item = obj(vec![
            ("text", Value::String("Stimpak".to_string())),
            ("count", Value::Int32(3)),
            ("equipState", Value::Int32(0)),
        ]);
        let inv = obj(vec![
            ("48", Value::Array(vec![item])),
            ("Version", Value::Int32(1)),
        ]);
        let root = obj(vec![("Inventory", inv)]);
        let inventory = Inventory::new(&root).unwrap();
        let items = inventory.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), Some("Stimpak"));
        assert_eq!(items[0].count(), Some(3));
    }

    #[test]
    fn inventory_is_none_when_the_key_is_absent() {
        let root = obj(vec![]);
        assert!(Inventory::new(&root).is_none());
    }

    #[test]
    fn item_favorite_is_none_when_not_favoritable() {
        let item = obj(vec![("canFavorite", Value::Bool(false))]);
        let inv = obj(vec![("29", Value::Array(vec![item]))]);
        let root = obj(vec![("Inventory", inv)]);
        let inventory = Inventory::new(&root).unwrap();
        assert_eq!(inventory.items()[0].favorite(), None);
    }
}
