//! Narrative engine
//!
//! Holds the story path, one deck position per path, and the persistent
//! city. At every round boundary the winning zone picks an option of the
//! current card, its effects land on the city, and the post-effect city
//! decides whether the path changes.
//!
//! ## Path hysteresis
//!
//! ```text
//!            budget < crisis_enter            budget > crisis_exit
//!   NORMAL ─────────────────────────▶ CRISIS ─────────────────────▶ NORMAL
//!          mobility < gridlock_enter        mobility > gridlock_exit
//!   NORMAL ─────────────────────────▶ GRIDLOCK ───────────────────▶ NORMAL
//!            green > eco_enter                 green < eco_exit
//!   NORMAL ─────────────────────────▶ ECO ────────────────────────▶ NORMAL
//! ```
//!
//! Entry checks run in that order, so CRISIS wins over GRIDLOCK over ECO.

use crate::deck::{Card, DeckSet};
use plaza_core::config::NarrativeThresholds;
use plaza_core::{CityAttribute, CityState, Path, Zone, ZoneTally};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Pick the round's winning zone.
///
/// Highest score wins. Ties go to the busiest zone right now; if that is
/// still a tie, `rng` picks uniformly among the remaining zones.
pub fn pick_winner<R: Rng + ?Sized>(
    scores: &ZoneTally,
    occupancy: &ZoneTally,
    rng: &mut R,
) -> Zone {
    let best_score = Zone::ALL.iter().map(|&z| scores[z]).max().unwrap_or(0);
    let tied: Vec<Zone> = Zone::ALL
        .into_iter()
        .filter(|&z| scores[z] == best_score)
        .collect();
    if let [only] = tied.as_slice() {
        return *only;
    }

    let best_count = tied.iter().map(|&z| occupancy[z]).max().unwrap_or(0);
    let busiest: Vec<Zone> = tied
        .into_iter()
        .filter(|&z| occupancy[z] == best_count)
        .collect();
    if let [only] = busiest.as_slice() {
        return *only;
    }

    // Zone::ALL is non-empty, so there is always at least one candidate
    *busiest.choose(rng).unwrap_or(&Zone::ALL[0])
}

/// Evaluate the path state machine on a post-effect city.
pub fn next_path(current: Path, city: &CityState, t: &NarrativeThresholds) -> Path {
    let budget = city[CityAttribute::Budget];
    let green = city[CityAttribute::Green];
    let mobility = city[CityAttribute::Mobility];

    match current {
        Path::Crisis if budget > t.crisis_exit => Path::Normal,
        Path::Eco if green < t.eco_exit => Path::Normal,
        Path::Gridlock if mobility > t.gridlock_exit => Path::Normal,
        Path::Crisis | Path::Eco | Path::Gridlock => current,
        Path::Normal => {
            if budget < t.crisis_enter {
                Path::Crisis
            } else if mobility < t.gridlock_enter {
                Path::Gridlock
            } else if green > t.eco_enter {
                Path::Eco
            } else {
                Path::Normal
            }
        }
    }
}

/// What happened at a round boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub winner: Zone,
    pub card_title: String,
    pub choice: String,
    pub from: Path,
    pub to: Path,
    /// The resolved card was a one-off transition card.
    pub was_transition: bool,
}

impl Resolution {
    pub fn path_changed(&self) -> bool {
        self.from != self.to
    }
}

pub struct Narrative {
    decks: DeckSet,
    thresholds: NarrativeThresholds,
    path: Path,
    positions: HashMap<Path, usize>,
    /// The next card is the current path's transition card.
    in_transition: bool,
    city: CityState,
}

impl Narrative {
    pub fn new(thresholds: NarrativeThresholds) -> Self {
        Self::with_city(thresholds, CityState::default())
    }

    pub fn with_city(thresholds: NarrativeThresholds, city: CityState) -> Self {
        Self {
            decks: DeckSet::standard(),
            thresholds,
            path: Path::Normal,
            positions: Path::ALL.into_iter().map(|p| (p, 0)).collect(),
            in_transition: false,
            city,
        }
    }

    pub fn path(&self) -> Path {
        self.path
    }

    pub fn city(&self) -> &CityState {
        &self.city
    }

    pub fn in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn deck_position(&self, path: Path) -> usize {
        self.positions.get(&path).copied().unwrap_or(0)
    }

    /// The card on display for the running round.
    pub fn current_card(&self) -> &Card {
        if self.in_transition {
            return self.decks.transition(self.path);
        }
        let deck = self.decks.deck(self.path);
        &deck[self.deck_position(self.path) % deck.len()]
    }

    /// Apply the winner's choice and move the story forward.
    pub fn resolve(&mut self, winner: Zone) -> Resolution {
        let from = self.path;
        let was_transition = self.in_transition;

        let card = self.current_card();
        let card_title = card.title.clone();
        let option = card.option(winner);
        let choice = option.text.clone();
        let effects = option.effects.clone();

        self.city.apply(&effects);

        if was_transition {
            // Transition cards are not part of the deck
            self.in_transition = false;
        } else {
            let len = self.decks.deck(from).len().max(1);
            let position = self.positions.entry(from).or_insert(0);
            *position = (*position + 1) % len;
        }

        let to = next_path(from, &self.city, &self.thresholds);
        if to != from {
            tracing::info!("Path changed {} -> {}", from, to);
            self.path = to;
            self.in_transition = true;
        }

        Resolution {
            winner,
            card_title,
            choice,
            from,
            to,
            was_transition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn thresholds() -> NarrativeThresholds {
        NarrativeThresholds::default()
    }

    fn city_with(attr: CityAttribute, value: i32) -> CityState {
        let mut city = CityState::default();
        city.adjust(attr, value - city[attr]);
        city
    }

    // ------------------------------------------------------------------
    // Winner
    // ------------------------------------------------------------------

    #[test]
    fn test_unique_max_score_wins() {
        let scores = ZoneTally::from_counts(1, 4, 2);
        let occupancy = ZoneTally::from_counts(9, 0, 0);
        let mut rng = StepRng::new(0, 0);
        assert_eq!(pick_winner(&scores, &occupancy, &mut rng), Zone::Green);
    }

    #[test]
    fn test_score_tie_broken_by_occupancy() {
        let scores = ZoneTally::from_counts(3, 3, 1);
        let occupancy = ZoneTally::from_counts(2, 5, 0);
        let mut rng = StepRng::new(0, 0);
        assert_eq!(pick_winner(&scores, &occupancy, &mut rng), Zone::Green);
    }

    #[test]
    fn test_occupancy_of_untied_zones_is_ignored() {
        // Mobility is busiest but not among the score leaders
        let scores = ZoneTally::from_counts(2, 2, 0);
        let occupancy = ZoneTally::from_counts(1, 0, 9);
        let mut rng = StepRng::new(0, 0);
        assert_eq!(pick_winner(&scores, &occupancy, &mut rng), Zone::Housing);
    }

    #[test]
    fn test_full_tie_falls_back_to_rng_within_tied_set() {
        let scores = ZoneTally::from_counts(2, 2, 0);
        let occupancy = ZoneTally::from_counts(1, 1, 4);
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let winner = pick_winner(&scores, &occupancy, &mut rng);
            assert!(matches!(winner, Zone::Housing | Zone::Green));
        }
    }

    #[test]
    fn test_injected_rng_makes_tie_break_deterministic() {
        let scores = ZoneTally::new();
        let occupancy = ZoneTally::new();
        // A generator that always yields zero picks the first candidate
        let mut rng = StepRng::new(0, 0);
        assert_eq!(pick_winner(&scores, &occupancy, &mut rng), Zone::Housing);

        let a = pick_winner(&scores, &occupancy, &mut StdRng::seed_from_u64(11));
        let b = pick_winner(&scores, &occupancy, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    // ------------------------------------------------------------------
    // Path FSM
    // ------------------------------------------------------------------

    #[test]
    fn test_crisis_hysteresis_trajectory() {
        let t = thresholds();
        let mut path = Path::Normal;
        let mut seen = Vec::new();
        for budget in [50, 20, 30, 40] {
            path = next_path(path, &city_with(CityAttribute::Budget, budget), &t);
            seen.push(path);
        }
        assert_eq!(
            seen,
            vec![Path::Normal, Path::Crisis, Path::Crisis, Path::Normal]
        );
    }

    #[test]
    fn test_exit_thresholds_are_strict() {
        let t = thresholds();
        let at_exit = city_with(CityAttribute::Budget, t.crisis_exit);
        assert_eq!(next_path(Path::Crisis, &at_exit, &t), Path::Crisis);

        let at_eco_exit = city_with(CityAttribute::Green, t.eco_exit);
        assert_eq!(next_path(Path::Eco, &at_eco_exit, &t), Path::Eco);
        let below = city_with(CityAttribute::Green, t.eco_exit - 1);
        assert_eq!(next_path(Path::Eco, &below, &t), Path::Normal);

        let at_gridlock_exit = city_with(CityAttribute::Mobility, t.gridlock_exit);
        assert_eq!(next_path(Path::Gridlock, &at_gridlock_exit, &t), Path::Gridlock);
        let above = city_with(CityAttribute::Mobility, t.gridlock_exit + 1);
        assert_eq!(next_path(Path::Gridlock, &above, &t), Path::Normal);
    }

    #[test]
    fn test_entry_priority_crisis_over_gridlock_over_eco() {
        let t = thresholds();
        let everything = CityState::new(50, 90, 10, 50, 10);
        assert_eq!(next_path(Path::Normal, &everything, &t), Path::Crisis);

        let jam_and_parks = CityState::new(50, 90, 10, 50, 50);
        assert_eq!(next_path(Path::Normal, &jam_and_parks, &t), Path::Gridlock);

        let parks = CityState::new(50, 90, 50, 50, 50);
        assert_eq!(next_path(Path::Normal, &parks, &t), Path::Eco);
    }

    #[test]
    fn test_non_normal_paths_ignore_other_entry_conditions() {
        let t = thresholds();
        // Deep in eco with a bankrupt city: only the green exit matters
        let city = CityState::new(50, 90, 10, 50, 0);
        assert_eq!(next_path(Path::Eco, &city, &t), Path::Eco);
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    #[test]
    fn test_resolve_applies_winning_effects() {
        let mut narrative = Narrative::new(thresholds());
        let card = narrative.current_card().clone();
        let resolution = narrative.resolve(Zone::Green);

        let mut expected = CityState::default();
        expected.apply(&card.option(Zone::Green).effects);
        assert_eq!(narrative.city(), &expected);
        assert_eq!(resolution.card_title, card.title);
        assert_eq!(resolution.choice, card.option(Zone::Green).text);
        assert!(!resolution.was_transition);
        assert_eq!(narrative.deck_position(Path::Normal), 1);
    }

    #[test]
    fn test_deck_wraps_around() {
        let mut narrative = Narrative::new(thresholds());
        let first = narrative.current_card().title.clone();
        let len = DeckSet::standard().deck(Path::Normal).len();
        for _ in 0..len {
            // Housing picks keep the default city away from every threshold
            narrative.city = CityState::default();
            narrative.resolve(Zone::Housing);
        }
        assert_eq!(narrative.path(), Path::Normal);
        assert_eq!(narrative.deck_position(Path::Normal), 0);
        assert_eq!(narrative.current_card().title, first);
    }

    #[test]
    fn test_path_change_shows_transition_card_then_resumes_deck() {
        let t = thresholds();
        let mut narrative = Narrative::with_city(t.clone(), CityState::new(50, 50, 50, 50, 26));
        // Normal card 0, housing option costs 8 budget → 18 < 25
        let resolution = narrative.resolve(Zone::Housing);
        assert_eq!(resolution.to, Path::Crisis);
        assert!(resolution.path_changed());
        assert!(narrative.in_transition());

        let decks = DeckSet::standard();
        assert_eq!(narrative.current_card(), decks.transition(Path::Crisis));
        assert_eq!(narrative.deck_position(Path::Crisis), 0);

        // Resolving the transition card does not consume the crisis deck
        let resolution = narrative.resolve(Zone::Housing);
        assert!(resolution.was_transition);
        assert_eq!(narrative.deck_position(Path::Crisis), 0);
        assert!(!narrative.in_transition());
        assert_eq!(narrative.current_card(), &decks.deck(Path::Crisis)[0]);

        // Normal deck remembered its own position
        assert_eq!(narrative.deck_position(Path::Normal), 1);
    }

    #[test]
    fn test_returning_to_a_path_keeps_its_deck_position() {
        let t = thresholds();
        let mut narrative = Narrative::with_city(t.clone(), CityState::new(50, 50, 50, 50, 26));
        narrative.resolve(Zone::Housing); // → CRISIS (transition pending)
        narrative.resolve(Zone::Housing); // transition card, budget 18+8=26
        assert_eq!(narrative.path(), Path::Crisis);

        // Crisis card 0: housing sells stock, +14 budget → 40 > 35
        let resolution = narrative.resolve(Zone::Housing);
        assert_eq!(resolution.to, Path::Normal);
        assert_eq!(narrative.deck_position(Path::Crisis), 1);
        assert!(narrative.in_transition());
        assert_eq!(narrative.current_card(), DeckSet::standard().transition(Path::Normal));

        narrative.resolve(Zone::Housing);
        assert_eq!(narrative.deck_position(Path::Normal), 1);
        assert_eq!(narrative.current_card(), &DeckSet::standard().deck(Path::Normal)[1]);
    }

    #[test]
    fn test_city_stays_in_bounds_under_repeated_resolution() {
        let mut narrative = Narrative::new(thresholds());
        for i in 0..200 {
            let winner = Zone::ALL[i % 3];
            narrative.resolve(winner);
            for (_, v) in narrative.city().iter() {
                assert!((0..=100).contains(&v));
            }
        }
    }
}
