//! Authored story cards
//!
//! Every path owns a cyclic deck of regular cards plus one transition card
//! that is shown once when the city enters that path. Each card offers one
//! option per floor zone; the zone that wins the round picks the option and
//! its effects.

use plaza_core::{CityAttribute, Path, Zone};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use plaza_core::CityAttribute::{Budget, Green, Housing, Mobility, Social};

/// One answer to a card, bound to the zone that selects it.
#[derive(Debug, Clone, PartialEq)]
pub struct CardOption {
    pub text: String,
    pub effects: Vec<(CityAttribute, i32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub situation: String,
    /// Options in floor order.
    options: [CardOption; 3],
}

impl Card {
    pub fn new(
        title: &str,
        situation: &str,
        housing: CardOption,
        green: CardOption,
        mobility: CardOption,
    ) -> Self {
        Self {
            title: title.to_string(),
            situation: situation.to_string(),
            options: [housing, green, mobility],
        }
    }

    pub fn option(&self, zone: Zone) -> &CardOption {
        match zone {
            Zone::Housing => &self.options[0],
            Zone::Green => &self.options[1],
            Zone::Mobility => &self.options[2],
        }
    }

    /// Option texts keyed by zone wire name, for the story document.
    pub fn option_texts(&self) -> OptionTexts<'_> {
        OptionTexts(self)
    }
}

/// Serializes a card's options as `{"HOUSING": text, ...}`.
pub struct OptionTexts<'a>(&'a Card);

impl Serialize for OptionTexts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Zone::ALL.len()))?;
        for zone in Zone::ALL {
            map.serialize_entry(zone.as_str(), &self.0.option(zone).text)?;
        }
        map.end()
    }
}

fn opt(text: &str, effects: &[(CityAttribute, i32)]) -> CardOption {
    CardOption {
        text: text.to_string(),
        effects: effects.to_vec(),
    }
}

/// Regular decks for every path plus their transition cards.
#[derive(Debug, Clone)]
pub struct DeckSet {
    normal: Vec<Card>,
    eco: Vec<Card>,
    crisis: Vec<Card>,
    gridlock: Vec<Card>,
    transitions: [Card; 4],
}

impl DeckSet {
    pub fn deck(&self, path: Path) -> &[Card] {
        match path {
            Path::Normal => &self.normal,
            Path::Eco => &self.eco,
            Path::Crisis => &self.crisis,
            Path::Gridlock => &self.gridlock,
        }
    }

    pub fn transition(&self, path: Path) -> &Card {
        match path {
            Path::Normal => &self.transitions[0],
            Path::Eco => &self.transitions[1],
            Path::Crisis => &self.transitions[2],
            Path::Gridlock => &self.transitions[3],
        }
    }

    /// The story shipped with the installation.
    pub fn standard() -> Self {
        Self {
            normal: normal_deck(),
            eco: eco_deck(),
            crisis: crisis_deck(),
            gridlock: gridlock_deck(),
            transitions: transition_cards(),
        }
    }
}

impl Default for DeckSet {
    fn default() -> Self {
        Self::standard()
    }
}

fn normal_deck() -> Vec<Card> {
    vec![
        Card::new(
            "More housing vs green space?",
            "An empty lot by the river is up for grabs.",
            opt("Build affordable flats", &[(Housing, 12), (Green, -6), (Budget, -8)]),
            opt("Plant a community park", &[(Green, 12), (Social, 4), (Budget, -6)]),
            opt("Pave a park-and-ride", &[(Mobility, 10), (Green, -8), (Budget, -4)]),
        ),
        Card::new(
            "Invest in public transport?",
            "The old tram line needs either money or a replacement.",
            opt("Sell the depot for homes", &[(Housing, 8), (Mobility, -6), (Budget, 6)]),
            opt("Electrify the tram", &[(Green, 6), (Mobility, 8), (Budget, -12)]),
            opt("Run extra express buses", &[(Mobility, 12), (Budget, -8)]),
        ),
        Card::new(
            "Build parking or bike lanes?",
            "Main street is being rebuilt and there is room for one thing.",
            opt("Street-level shops with flats above", &[(Housing, 6), (Social, 6), (Budget, -4)]),
            opt("Tree-lined bike lanes", &[(Green, 8), (Mobility, 4), (Budget, -6)]),
            opt("A parking garage", &[(Mobility, 6), (Green, -6), (Budget, 4)]),
        ),
        Card::new(
            "Expand parks or apartments?",
            "The northern district keeps growing.",
            opt("Densify with apartment blocks", &[(Housing, 14), (Social, -4), (Budget, -6)]),
            opt("Extend the forest belt", &[(Green, 10), (Housing, -4), (Budget, -4)]),
            opt("Connect it with a ring road", &[(Mobility, 10), (Green, -10), (Budget, -8)]),
        ),
        Card::new(
            "More offices downtown?",
            "A tech firm wants a headquarters in the centre.",
            opt("Only if it includes housing", &[(Housing, 8), (Budget, 6)]),
            opt("Require a green roof and plaza", &[(Green, 6), (Social, 4), (Budget, 4)]),
            opt("Approve it with a new interchange", &[(Mobility, 6), (Budget, 10), (Green, -6)]),
        ),
    ]
}

fn eco_deck() -> Vec<Card> {
    vec![
        Card::new(
            "Rewild the canal?",
            "Residents want the concrete canal banks turned back into wetland.",
            opt("Build floating homes instead", &[(Housing, 8), (Green, -6), (Budget, -4)]),
            opt("Let the wetland return", &[(Green, 8), (Social, 4), (Budget, -6)]),
            opt("Add a towpath cycle route", &[(Mobility, 6), (Green, 2), (Budget, -4)]),
        ),
        Card::new(
            "Car-free Sundays?",
            "The green movement asks for streets without cars once a week.",
            opt("Open streets to block parties", &[(Social, 8), (Housing, 2), (Budget, -2)]),
            opt("Every Sunday, city-wide", &[(Green, 6), (Mobility, -6), (Social, 4)]),
            opt("Only on the ring road", &[(Mobility, 4), (Green, 2)]),
        ),
        Card::new(
            "Solar roofs everywhere?",
            "A subsidy scheme could cover most rooftops in the city.",
            opt("Fund it through rent levies", &[(Housing, -6), (Green, 8), (Budget, 4)]),
            opt("Full public subsidy", &[(Green, 10), (Budget, -12)]),
            opt("Solar canopies over car parks", &[(Green, 4), (Mobility, 4), (Budget, -6)]),
        ),
    ]
}

fn crisis_deck() -> Vec<Card> {
    vec![
        Card::new(
            "Cut services or raise taxes?",
            "The treasury is empty and creditors are calling.",
            opt("Sell public housing stock", &[(Housing, -10), (Budget, 14), (Social, -6)]),
            opt("Close a park for development", &[(Green, -10), (Budget, 12)]),
            opt("Introduce a congestion charge", &[(Mobility, -6), (Budget, 12)]),
        ),
        Card::new(
            "Emergency loan?",
            "A bank offers a loan with strict conditions attached.",
            opt("Accept and freeze construction", &[(Housing, -6), (Budget, 10)]),
            opt("Refuse and ask for volunteers", &[(Social, 8), (Green, 2), (Budget, 4)]),
            opt("Accept and cut bus routes", &[(Mobility, -8), (Budget, 12)]),
        ),
        Card::new(
            "Strike at city hall",
            "Public workers walk out over unpaid wages.",
            opt("Pay them with housing vouchers", &[(Housing, -4), (Social, 6), (Budget, 6)]),
            opt("Pause park maintenance", &[(Green, -8), (Budget, 10)]),
            opt("Privatise the parking meters", &[(Mobility, -4), (Budget, 14), (Social, -4)]),
        ),
    ]
}

fn gridlock_deck() -> Vec<Card> {
    vec![
        Card::new(
            "Traffic has stopped moving",
            "Commutes now take two hours and deliveries are failing.",
            opt("Let people live near work", &[(Housing, 6), (Mobility, 6), (Budget, -6)]),
            opt("Pop-up bike lanes overnight", &[(Mobility, 8), (Green, 4), (Budget, -4)]),
            opt("Widen the arterial roads", &[(Mobility, 14), (Green, -8), (Budget, -10)]),
        ),
        Card::new(
            "Ration the roads?",
            "Engineers propose odd/even number plate days.",
            opt("Remote-work hubs in every block", &[(Housing, 4), (Mobility, 8), (Budget, -6)]),
            opt("Odd/even days plus free trams", &[(Mobility, 10), (Green, 4), (Budget, -8)]),
            opt("Toll every bridge", &[(Mobility, 8), (Budget, 8), (Social, -6)]),
        ),
        Card::new(
            "Freight chaos",
            "Lorries are blocking the old town every morning.",
            opt("Convert depots into homes", &[(Housing, 8), (Mobility, -2)]),
            opt("Cargo bikes for the last mile", &[(Mobility, 8), (Green, 4), (Budget, -4)]),
            opt("Night-time delivery windows", &[(Mobility, 10), (Social, -4)]),
        ),
    ]
}

fn transition_cards() -> [Card; 4] {
    [
        Card::new(
            "Back to business as usual",
            "The city catches its breath. What should it focus on next?",
            opt("Homes first", &[(Housing, 4)]),
            opt("Keep it green", &[(Green, 4)]),
            opt("Keep it moving", &[(Mobility, 4)]),
        ),
        Card::new(
            "The green wave",
            "Parks are everywhere and people want the city to go further.",
            opt("Green housing co-ops", &[(Housing, 4), (Green, 2), (Budget, -4)]),
            opt("Declare a climate emergency", &[(Green, 6), (Social, 4), (Budget, -6)]),
            opt("Electric shuttle network", &[(Mobility, 6), (Budget, -6)]),
        ),
        Card::new(
            "The city is broke",
            "The budget has collapsed. Everything now costs twice as much.",
            opt("Freeze new housing", &[(Housing, -4), (Budget, 8)]),
            opt("Mothball the parks department", &[(Green, -6), (Budget, 8)]),
            opt("Cut night buses", &[(Mobility, -6), (Budget, 8)]),
        ),
        Card::new(
            "Gridlock",
            "Nothing moves. The whole city is one traffic jam.",
            opt("Move jobs to the suburbs", &[(Housing, 2), (Mobility, 6), (Budget, -4)]),
            opt("Close the centre to cars", &[(Green, 4), (Mobility, 6), (Social, -2)]),
            opt("Emergency road works", &[(Mobility, 10), (Budget, -8)]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_deck_has_several_cards() {
        let decks = DeckSet::standard();
        for path in Path::ALL {
            assert!(decks.deck(path).len() >= 3, "{} deck too short", path);
        }
    }

    #[test]
    fn test_every_option_has_text_and_effects() {
        let decks = DeckSet::standard();
        let cards = Path::ALL
            .into_iter()
            .flat_map(|p| decks.deck(p).iter().chain(std::iter::once(decks.transition(p))));
        for card in cards {
            assert!(!card.title.is_empty());
            for zone in Zone::ALL {
                let option = card.option(zone);
                assert!(!option.text.is_empty(), "{}: empty option", card.title);
                assert!(!option.effects.is_empty(), "{}: no effects", card.title);
            }
        }
    }

    #[test]
    fn test_option_texts_serialize_by_zone() {
        let decks = DeckSet::standard();
        let card = &decks.deck(Path::Normal)[0];
        let json = serde_json::to_value(card.option_texts()).unwrap();
        assert_eq!(json["GREEN"], "Plant a community park");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
