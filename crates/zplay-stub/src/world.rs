//! Locations, items and mutable world state.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::Direction;

/// The four places around the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Location {
    /// Starting location, with the mailbox.
    WestOfHouse,
    /// North side of the house.
    NorthOfHouse,
    /// South side of the house.
    SouthOfHouse,
    /// East side of the house.
    BehindHouse,
}

impl Location {
    /// Room title.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WestOfHouse => "West of House",
            Self::NorthOfHouse => "North of House",
            Self::SouthOfHouse => "South of House",
            Self::BehindHouse => "Behind House",
        }
    }

    /// Long room description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::WestOfHouse => {
                "You are standing in an open field west of a white house, with a boarded front door."
            }
            Self::NorthOfHouse => {
                "You are facing the north side of a white house. There is no door here, and all the windows are boarded up. To the north a narrow path winds through the trees."
            }
            Self::SouthOfHouse => {
                "You are facing the south side of a white house. There is no door here, and all the windows are boarded."
            }
            Self::BehindHouse => {
                "You are behind the white house. A path leads into the forest to the east. In one corner of the house there is a small window which is slightly ajar."
            }
        }
    }

    /// Where `direction` leads from here, if anywhere.
    pub fn exit(&self, direction: Direction) -> Option<Location> {
        use Direction::*;
        use Location::*;
        match (self, direction) {
            (WestOfHouse, North) => Some(NorthOfHouse),
            (WestOfHouse, South) => Some(SouthOfHouse),
            (NorthOfHouse, West | Southwest) => Some(WestOfHouse),
            (NorthOfHouse, East | Southeast) => Some(BehindHouse),
            (SouthOfHouse, West | Northwest) => Some(WestOfHouse),
            (SouthOfHouse, East | Northeast) => Some(BehindHouse),
            (BehindHouse, North | Northwest) => Some(NorthOfHouse),
            (BehindHouse, South | Southwest) => Some(SouthOfHouse),
            _ => None,
        }
    }
}

/// Portable objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Item {
    /// The advertising brochure kept in the mailbox.
    Brochure,
}

impl Item {
    /// Match a typed noun.
    pub fn parse(noun: &str) -> Option<Self> {
        match noun {
            "brochure" | "leaflet" | "pamphlet" | "booklet" => Some(Self::Brochure),
            _ => None,
        }
    }

    /// Name with an indefinite article.
    pub fn indefinite(&self) -> &'static str {
        match self {
            Self::Brochure => "a brochure",
        }
    }
}

/// Where an item currently is when not carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Inside the mailbox.
    Mailbox,
    /// On the ground somewhere.
    Ground(Location),
}

/// The complete mutable state of the scripted game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    /// Where the player stands.
    pub location: Location,
    /// Items carried.
    pub inventory: BTreeSet<Item>,
    /// Items not carried, and where they lie.
    pub placed: BTreeMap<Item, Place>,
    /// Whether the mailbox lid is open.
    pub mailbox_opened: bool,
}

impl Default for World {
    fn default() -> Self {
        Self {
            location: Location::WestOfHouse,
            inventory: BTreeSet::new(),
            placed: BTreeMap::from([(Item::Brochure, Place::Mailbox)]),
            mailbox_opened: false,
        }
    }
}

impl World {
    /// Whether the player carries `item`.
    pub fn holds(&self, item: Item) -> bool {
        self.inventory.contains(&item)
    }

    /// Whether `item` is visible and reachable without being carried.
    pub fn reachable(&self, item: Item) -> bool {
        match self.placed.get(&item) {
            Some(Place::Mailbox) => self.location == Location::WestOfHouse && self.mailbox_opened,
            Some(Place::Ground(at)) => *at == self.location,
            None => false,
        }
    }

    /// Move `item` into the inventory.
    pub fn pick_up(&mut self, item: Item) {
        self.placed.remove(&item);
        self.inventory.insert(item);
    }

    /// Drop `item` at the current location.
    pub fn put_down(&mut self, item: Item) {
        self.inventory.remove(&item);
        self.placed.insert(item, Place::Ground(self.location));
    }

    /// Items lying on the ground here.
    pub fn items_here(&self) -> impl Iterator<Item = Item> + '_ {
        self.placed
            .iter()
            .filter(|(_, place)| **place == Place::Ground(self.location))
            .map(|(item, _)| *item)
    }

    /// Items inside the mailbox.
    pub fn mailbox_contents(&self) -> impl Iterator<Item = Item> + '_ {
        self.placed
            .iter()
            .filter(|(_, place)| **place == Place::Mailbox)
            .map(|(item, _)| *item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_around_the_house() {
        let mut here = Location::WestOfHouse;
        for (dir, expected) in [
            (Direction::North, Location::NorthOfHouse),
            (Direction::East, Location::BehindHouse),
            (Direction::South, Location::SouthOfHouse),
            (Direction::West, Location::WestOfHouse),
        ] {
            here = here.exit(dir).unwrap();
            assert_eq!(here, expected);
        }
        assert_eq!(here.exit(Direction::East), None);
    }

    #[test]
    fn brochure_starts_in_closed_mailbox() {
        let world = World::default();
        assert!(!world.reachable(Item::Brochure));
        assert_eq!(world.mailbox_contents().collect::<Vec<_>>(), [Item::Brochure]);
    }

    #[test]
    fn dropped_items_stay_put() {
        let mut world = World::default();
        world.pick_up(Item::Brochure);
        world.location = Location::BehindHouse;
        world.put_down(Item::Brochure);
        assert!(world.reachable(Item::Brochure));
        world.location = Location::WestOfHouse;
        assert!(!world.reachable(Item::Brochure));
    }
}
