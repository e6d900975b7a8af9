use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

const PEOPLE_SORT_FIELDS: &[&str] =
	&["birth_year", "created", "edited", "gender", "height", "mass", "name"];
const PLANETS_SORT_FIELDS: &[&str] = &[
	"climate",
	"created",
	"diameter",
	"edited",
	"name",
	"orbital_period",
	"population",
	"rotation_period",
	"surface_water",
	"terrain",
];
const STARSHIPS_SORT_FIELDS: &[&str] = &[
	"cost_in_credits",
	"created",
	"crew",
	"edited",
	"length",
	"manufacturer",
	"model",
	"name",
	"passengers",
	"starship_class",
];
const FILMS_SORT_FIELDS: &[&str] =
	&["created", "director", "edited", "episode_id", "producer", "release_date", "title"];
const SPECIES_SORT_FIELDS: &[&str] = &[
	"average_height",
	"average_lifespan",
	"classification",
	"created",
	"designation",
	"edited",
	"language",
	"name",
];
const VEHICLES_SORT_FIELDS: &[&str] = &[
	"cost_in_credits",
	"created",
	"crew",
	"edited",
	"length",
	"manufacturer",
	"model",
	"name",
	"passengers",
	"vehicle_class",
];

/// The closed set of entity categories served by the upstream catalog.
///
/// Names match the upstream path segments, so `people` rather than `person`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
	Films,
	People,
	Planets,
	Species,
	Starships,
	Vehicles,
}
impl ResourceKind {
	pub const ALL: [Self; 6] =
		[Self::Films, Self::People, Self::Planets, Self::Species, Self::Starships, Self::Vehicles];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Films => "films",
			Self::People => "people",
			Self::Planets => "planets",
			Self::Species => "species",
			Self::Starships => "starships",
			Self::Vehicles => "vehicles",
		}
	}

	/// Fields a caller may sort search results by, in ascending name order.
	pub fn sort_fields(self) -> &'static [&'static str] {
		match self {
			Self::Films => FILMS_SORT_FIELDS,
			Self::People => PEOPLE_SORT_FIELDS,
			Self::Planets => PLANETS_SORT_FIELDS,
			Self::Species => SPECIES_SORT_FIELDS,
			Self::Starships => STARSHIPS_SORT_FIELDS,
			Self::Vehicles => VEHICLES_SORT_FIELDS,
		}
	}

	pub fn allows_sort(self, field: &str) -> bool {
		self.sort_fields().contains(&field)
	}

	/// Document fields that hold references to other entities, traversed by the graph builder.
	pub fn relations(self) -> &'static [&'static str] {
		match self {
			Self::Films => &["characters", "planets", "starships", "vehicles", "species"],
			Self::People => &["films", "homeworld", "species", "starships", "vehicles"],
			Self::Planets => &["residents", "films"],
			Self::Species => &["people", "films", "homeworld"],
			Self::Starships => &["films", "pilots"],
			Self::Vehicles => &["films", "pilots"],
		}
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ResourceKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| Error::UnknownResource { name: s.to_string() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_every_upstream_segment() {
		for kind in ResourceKind::ALL {
			assert_eq!(kind.as_str().parse::<ResourceKind>().expect("parse failed"), kind);
		}

		assert!("person".parse::<ResourceKind>().is_err());
		assert!("".parse::<ResourceKind>().is_err());
	}

	#[test]
	fn sort_fields_are_sorted() {
		for kind in ResourceKind::ALL {
			let fields = kind.sort_fields();

			assert!(fields.windows(2).all(|pair| pair[0] < pair[1]), "{kind} is not sorted");
			assert!(fields.contains(&"created") && fields.contains(&"edited"));
		}
	}

	#[test]
	fn people_relations_match_upstream_links() {
		assert_eq!(
			ResourceKind::People.relations(),
			&["films", "homeworld", "species", "starships", "vehicles"]
		);
		assert!(ResourceKind::Films.allows_sort("episode_id"));
		assert!(!ResourceKind::People.allows_sort("episode_id"));
	}
}
