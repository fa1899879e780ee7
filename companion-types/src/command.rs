//! The remote command catalogue.

use serde::{Deserialize, Serialize};

/// Fixed, ordered remote command catalogue; the wire value is the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    UseItem = 0,
    DropItem = 1,
    SetFavorite = 2,
    ToggleComponentFavorite = 3,
    SortInventory = 4,
    ToggleQuestActive = 5,
    SetCustomMapMarker = 6,
    RemoveCustomMapMarker = 7,
    CheckFastTravel = 8,
    FastTravel = 9,
    MoveLocalMap = 10,
    ZoomLocalMap = 11,
    ToggleRadioStation = 12,
    RequestLocalMapSnapshot = 13,
    ClearIdle = 14,
}

impl CommandKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::UseItem,
            1 => Self::DropItem,
            2 => Self::SetFavorite,
            3 => Self::ToggleComponentFavorite,
            4 => Self::SortInventory,
            5 => Self::ToggleQuestActive,
            6 => Self::SetCustomMapMarker,
            7 => Self::RemoveCustomMapMarker,
            8 => Self::CheckFastTravel,
            9 => Self::FastTravel,
            10 => Self::MoveLocalMap,
            11 => Self::ZoomLocalMap,
            12 => Self::ToggleRadioStation,
            13 => Self::RequestLocalMapSnapshot,
            14 => Self::ClearIdle,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(tag)
    }
}

/// Location-marker kinds, a separate fixed enumeration used as an argument
/// to `SetCustomMapMarker`. Indices 66 and 68 name the same marker in the
/// source this catalogue was distilled from; they are given distinct names
/// here rather than carried over as a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LocationMarkerKind {
    Cave = 0,
    City = 1,
    DiamondCity = 2,
    Encampment = 3,
    Factory = 4,
    Monument = 5,
    Metro = 6,
    MilitaryBase = 7,
    Landmark = 8,
    Office = 9,
    TownRuins = 10,
    UrbanRuins = 11,
    SanctuaryHills = 12,
    Settlement = 13,
    Sewer = 14,
    Vault = 15,
    Airfield = 16,
    BunkerHill = 17,
    Camper = 18,
    Car = 19,
    Church = 20,
    CountryClub = 21,
    CustomHouse = 22,
    DriveIn = 23,
    ElevatedHighway = 24,
    FaneuilHall = 25,
    Farm = 26,
    FillingStation = 27,
    Forested = 28,
    Goodneighbor = 29,
    Graveyard = 30,
    Hospital = 31,
    IndustrialDome = 32,
    IndustrialStacks = 33,
    Institute = 34,
    IrishPride = 35,
    Junkyard = 36,
    Observatory = 37,
    Pier = 38,
    PondLake = 39,
    Quarry = 40,
    RadioactiveArea = 41,
    RadioTower = 42,
    Salem = 43,
    School = 44,
    Shipwreck = 45,
    Submarine = 46,
    SwanPond = 47,
    SynthHead = 48,
    Town = 49,
    BrotherhoodOfSteel = 50,
    Brownstone = 51,
    Bunker = 52,
    Castle = 53,
    Skyscraper = 54,
    Libertalia = 55,
    LowRise = 56,
    Minutemen = 57,
    PoliceStation = 58,
    Prydwen = 59,
    RailroadFaction = 60,
    Railroad = 61,
    Satellite = 62,
    Sentinel = 63,
    UssConstitution = 64,
    Door = 65,
    Quest = 66,
    QuestDoor = 67,
    QuestSecondary = 68,
    PlayerSet = 69,
    PlayerLocation = 70,
    PowerArmorLocation = 71,
}

impl LocationMarkerKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        use LocationMarkerKind::*;
        const TABLE: [LocationMarkerKind; 72] = [
            Cave, City, DiamondCity, Encampment, Factory, Monument, Metro, MilitaryBase, Landmark,
            Office, TownRuins, UrbanRuins, SanctuaryHills, Settlement, Sewer, Vault, Airfield,
            BunkerHill, Camper, Car, Church, CountryClub, CustomHouse, DriveIn, ElevatedHighway,
            FaneuilHall, Farm, FillingStation, Forested, Goodneighbor, Graveyard, Hospital,
            IndustrialDome, IndustrialStacks, Institute, IrishPride, Junkyard, Observatory, Pier,
            PondLake, Quarry, RadioactiveArea, RadioTower, Salem, School, Shipwreck, Submarine,
            SwanPond, SynthHead, Town, BrotherhoodOfSteel, Brownstone, Bunker, Castle, Skyscraper,
            Libertalia, LowRise, Minutemen, PoliceStation, Prydwen, RailroadFaction, Railroad,
            Satellite, Sentinel, UssConstitution, Door, Quest, QuestDoor, QuestSecondary,
            PlayerSet, PlayerLocation, PowerArmorLocation,
        ];
        TABLE.get(tag as usize).copied()
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A caller-initiated command request, ready to be JSON-encoded as the
/// `COMMAND` frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: u8,
    pub args: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kind_round_trips_every_tag() {
        for tag in 0..=14u8 {
            assert_eq!(CommandKind::from_tag(tag).unwrap().tag(), tag);
        }
        assert!(CommandKind::from_tag(15).is_none());
    }

    #[test]
    fn marker_kind_covers_all_72_indices_with_distinct_names() {
        let mut seen = std::collections::HashSet::new();
        for tag in 0..72u8 {
            let marker = LocationMarkerKind::from_tag(tag).unwrap();
            assert_eq!(marker.tag(), tag);
            assert!(seen.insert(tag));
        }
        assert!(LocationMarkerKind::from_tag(72).is_none());
    }

    #[test]
    fn command_request_serializes_with_type_field_name() {
        // matches the documented "use item" request shape.
        let req = CommandRequest {
            id: 0,
            kind: CommandKind::UseItem.tag(),
            args: vec![serde_json::json!(5), serde_json::json!(17)],
        };
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(encoded, serde_json::json!({"id": 0, "type": 0, "args": [5, 17]}));
    }
}
