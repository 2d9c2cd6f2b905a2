use serde::{Deserialize, Serialize};

use super::PerfumeKey;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    Own,
    Want,
    Tried,
}

impl Shelf {
    pub const ALL: [Shelf; 3] = [Shelf::Own, Shelf::Want, Shelf::Tried];
}

impl std::str::FromStr for Shelf {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "own" => Ok(Shelf::Own),
            "want" => Ok(Shelf::Want),
            "tried" => Ok(Shelf::Tried),
            other => Err(format!("Unknown wardrobe shelf '{}'", other)),
        }
    }
}

/// The user's collection, split over three disjoint shelves
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Wardrobe {
    pub own: Vec<PerfumeKey>,
    pub want: Vec<PerfumeKey>,
    pub tried: Vec<PerfumeKey>,
}

impl Wardrobe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shelf(&self, shelf: Shelf) -> &[PerfumeKey] {
        match shelf {
            Shelf::Own => &self.own,
            Shelf::Want => &self.want,
            Shelf::Tried => &self.tried,
        }
    }

    fn shelf_mut(&mut self, shelf: Shelf) -> &mut Vec<PerfumeKey> {
        match shelf {
            Shelf::Own => &mut self.own,
            Shelf::Want => &mut self.want,
            Shelf::Tried => &mut self.tried,
        }
    }

    /// Puts the item on `shelf`, taking it off whichever shelf held it before
    pub fn move_to(&mut self, key: PerfumeKey, shelf: Shelf) {
        for s in Shelf::ALL {
            self.shelf_mut(s).retain(|k| k != &key);
        }
        self.shelf_mut(shelf).push(key);
    }

    pub fn shelf_of(&self, key: &PerfumeKey) -> Option<Shelf> {
        Shelf::ALL
            .into_iter()
            .find(|s| self.shelf(*s).contains(key))
    }

    pub fn len(&self) -> usize {
        self.own.len() + self.want.len() + self.tried.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
