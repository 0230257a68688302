//! The four upper title tiers and their assembly from holdings.
//!
//! Grouping at every step is driven by injected lookup tables
//! ([`HierarchyKeys`]): holding -> county, county -> duchy, duchy -> kingdom,
//! kingdom -> empire. The assembler never infers a grouping from geometry or
//! culture; callers without richer sources can derive a default keying from
//! the state table via [`HierarchyKeys::from_states`].
//!
//! Entities are plain structs in per-tier arenas addressed by id, with the
//! parent relations kept as explicit tables. Liege back-references are set
//! right after each grouping step and never mutated afterwards. Holders are
//! never set here; assigning characters to titles is an external policy
//! applied through [`Hierarchy::assign_holder`].

use crate::error::ConvertError;
use crate::holdings::Holding;
use crate::palette;
use std::collections::{BTreeMap, HashMap};

/// An external character that may hold titles. Referenced, never owned, by
/// title `holder` fields; one character may hold many titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: String,
}

/// Stable identity of any title tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TitleId {
    Holding(u32),
    County(u32),
    Duchy(u32),
    Kingdom(u32),
    Empire(u32),
}

impl TitleId {
    /// Export tag, e.g. `c_12`.
    pub fn tag(&self) -> String {
        match self {
            TitleId::Holding(id) => format!("b_{}", id),
            TitleId::County(id) => format!("c_{}", id),
            TitleId::Duchy(id) => format!("d_{}", id),
            TitleId::Kingdom(id) => format!("k_{}", id),
            TitleId::Empire(id) => format!("e_{}", id),
        }
    }
}

/// Common capability of every title tier.
pub trait Title {
    fn title_id(&self) -> TitleId;
    fn name(&self) -> &str;
    fn color(&self) -> [u8; 3];
    /// Display name of the capital child, if the tier has one.
    fn capital_name(&self) -> Option<&str>;
    /// Immediate parent tier; `None` at the top of the tree.
    fn liege(&self) -> Option<TitleId>;
}

#[derive(Debug, Clone)]
pub struct County {
    pub id: u32,
    pub name: String,
    pub color: [u8; 3],
    pub capital: u32,
    pub capital_name: String,
    /// Member holding ids, sorted.
    pub holdings: Vec<u32>,
    pub liege: Option<TitleId>,
    pub holder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Duchy {
    pub id: u32,
    pub name: String,
    pub color: [u8; 3],
    pub capital: u32,
    pub capital_name: String,
    pub counties: Vec<u32>,
    pub liege: Option<TitleId>,
    pub holder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Kingdom {
    pub id: u32,
    pub name: String,
    pub color: [u8; 3],
    pub capital: u32,
    pub capital_name: String,
    pub duchies: Vec<u32>,
    /// Disallowed kingdoms are built (children still need a parent) but
    /// excluded from every export pass.
    pub allowed: bool,
    pub liege: Option<TitleId>,
    pub holder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Empire {
    pub id: u32,
    pub name: String,
    pub color: [u8; 3],
    pub capital: u32,
    pub capital_name: String,
    pub kingdoms: Vec<u32>,
    pub allowed: bool,
    pub holder: Option<String>,
}

macro_rules! impl_title {
    ($ty:ident, $variant:ident) => {
        impl Title for $ty {
            fn title_id(&self) -> TitleId {
                TitleId::$variant(self.id)
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn color(&self) -> [u8; 3] {
                self.color
            }
            fn capital_name(&self) -> Option<&str> {
                Some(&self.capital_name)
            }
            fn liege(&self) -> Option<TitleId> {
                self.liege
            }
        }
    };
}

impl_title!(County, County);
impl_title!(Duchy, Duchy);
impl_title!(Kingdom, Kingdom);

impl Title for Empire {
    fn title_id(&self) -> TitleId {
        TitleId::Empire(self.id)
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn color(&self) -> [u8; 3] {
        self.color
    }
    fn capital_name(&self) -> Option<&str> {
        Some(&self.capital_name)
    }
    fn liege(&self) -> Option<TitleId> {
        None
    }
}

impl Title for Holding {
    fn title_id(&self) -> TitleId {
        TitleId::Holding(self.id)
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn color(&self) -> [u8; 3] {
        self.color
    }
    fn capital_name(&self) -> Option<&str> {
        None
    }
    fn liege(&self) -> Option<TitleId> {
        self.liege
    }
}

/// Descriptor for one group at any tier: identity, display name, optional
/// designated capital (a child id), and the emission gate (only meaningful
/// for kingdoms and empires).
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub id: u32,
    pub name: String,
    pub capital: Option<u32>,
    pub allowed: bool,
}

impl GroupSpec {
    pub fn named(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            capital: None,
            allowed: true,
        }
    }
}

/// Injected grouping tables for the whole hierarchy.
#[derive(Debug, Clone, Default)]
pub struct HierarchyKeys {
    pub county_of_holding: HashMap<u32, u32>,
    pub counties: BTreeMap<u32, GroupSpec>,
    pub duchy_of_county: HashMap<u32, u32>,
    pub duchies: BTreeMap<u32, GroupSpec>,
    pub kingdom_of_duchy: HashMap<u32, u32>,
    pub kingdoms: BTreeMap<u32, GroupSpec>,
    pub empire_of_kingdom: HashMap<u32, u32>,
    pub empires: BTreeMap<u32, GroupSpec>,
}

impl HierarchyKeys {
    /// Default keying derived from the state table: one county, one duchy
    /// and one kingdom per state (state id reused at each tier), and a
    /// single empire spanning all kingdoms. Callers with richer grouping
    /// sources should build the tables themselves instead.
    pub fn from_states(states: &[crate::ingest::StateRecord], holdings: &[Holding]) -> Self {
        let mut keys = HierarchyKeys::default();
        let state_name = |id: u32| -> String {
            states
                .iter()
                .find(|s| s.i == id)
                .map(|s| s.name.clone())
                .unwrap_or_default()
        };

        for holding in holdings {
            let state = holding.state;
            keys.county_of_holding.insert(holding.id, state);
            if !keys.counties.contains_key(&state) {
                keys.counties.insert(state, GroupSpec::named(state, &state_name(state)));
                keys.duchy_of_county.insert(state, state);
                keys.duchies.insert(state, GroupSpec::named(state, &state_name(state)));
                keys.kingdom_of_duchy.insert(state, state);
                keys.kingdoms.insert(state, GroupSpec::named(state, &state_name(state)));
                keys.empire_of_kingdom.insert(state, 1);
            }
        }
        if !keys.empire_of_kingdom.is_empty() {
            keys.empires.insert(1, GroupSpec::named(1, ""));
        }
        keys
    }
}

/// The assembled title tree plus its parent relation tables.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub counties: BTreeMap<u32, County>,
    pub duchies: BTreeMap<u32, Duchy>,
    pub kingdoms: BTreeMap<u32, Kingdom>,
    pub empires: BTreeMap<u32, Empire>,
    county_of_holding: BTreeMap<u32, u32>,
    duchy_of_county: BTreeMap<u32, u32>,
    kingdom_of_duchy: BTreeMap<u32, u32>,
    empire_of_kingdom: BTreeMap<u32, u32>,
}

impl Hierarchy {
    /// Kingdoms that pass the emission gate, in id order.
    pub fn emittable_kingdoms(&self) -> impl Iterator<Item = &Kingdom> {
        self.kingdoms.values().filter(|k| k.allowed)
    }

    /// Empires that pass the emission gate, in id order.
    pub fn emittable_empires(&self) -> impl Iterator<Item = &Empire> {
        self.empires.values().filter(|e| e.allowed)
    }

    /// Immediate parent of any title, from the relation tables.
    pub fn liege_of(&self, id: TitleId) -> Option<TitleId> {
        match id {
            TitleId::Holding(h) => self.county_of_holding.get(&h).copied().map(TitleId::County),
            TitleId::County(c) => self.duchy_of_county.get(&c).copied().map(TitleId::Duchy),
            TitleId::Duchy(d) => self.kingdom_of_duchy.get(&d).copied().map(TitleId::Kingdom),
            TitleId::Kingdom(k) => self.empire_of_kingdom.get(&k).copied().map(TitleId::Empire),
            TitleId::Empire(_) => None,
        }
    }

    /// Walk lieges upward from `id` (exclusive) to the root.
    pub fn liege_chain(&self, id: TitleId) -> Vec<TitleId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.liege_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Assign a character as holder of a title. External policy seam; the
    /// assembler itself never sets holders.
    pub fn assign_holder(&mut self, id: TitleId, character: &Character) -> Result<(), ConvertError> {
        let missing = || ConvertError::DataIntegrity(format!("no such title {}", id.tag()));
        match id {
            TitleId::County(c) => {
                self.counties.get_mut(&c).ok_or_else(missing)?.holder = Some(character.id.clone())
            }
            TitleId::Duchy(d) => {
                self.duchies.get_mut(&d).ok_or_else(missing)?.holder = Some(character.id.clone())
            }
            TitleId::Kingdom(k) => {
                self.kingdoms.get_mut(&k).ok_or_else(missing)?.holder = Some(character.id.clone())
            }
            TitleId::Empire(e) => {
                self.empires.get_mut(&e).ok_or_else(missing)?.holder = Some(character.id.clone())
            }
            TitleId::Holding(_) => return Err(missing()),
        }
        Ok(())
    }
}

/// Group `members` (child id -> parent key) into sorted per-parent lists,
/// failing on any child with no key.
fn group_children(
    tier: &str,
    children: impl Iterator<Item = u32>,
    parent_of: &HashMap<u32, u32>,
) -> Result<BTreeMap<u32, Vec<u32>>, ConvertError> {
    let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for child in children {
        let parent = parent_of.get(&child).ok_or_else(|| {
            ConvertError::DataIntegrity(format!("{} {} has no grouping key", tier, child))
        })?;
        groups.entry(*parent).or_default().push(child);
    }
    Ok(groups)
}

/// Pick the capital child: the designated one when present in the group,
/// otherwise the lowest child id. Lowest id is stable under geometry edits,
/// which keeps re-exports diffable.
fn pick_capital(spec: &GroupSpec, members: &[u32]) -> u32 {
    match spec.capital {
        Some(c) if members.contains(&c) => c,
        _ => members[0],
    }
}

fn spec_for<'a>(
    tier: &str,
    specs: &'a BTreeMap<u32, GroupSpec>,
    id: u32,
) -> Result<&'a GroupSpec, ConvertError> {
    specs.get(&id).ok_or_else(|| {
        ConvertError::DataIntegrity(format!("{} group {} has no descriptor", tier, id))
    })
}

// Tier salts keep per-parent color seeds from colliding across tiers.
const SEED_HOLDING: u64 = 1 << 32;
const SEED_COUNTY: u64 = 2 << 32;
const SEED_DUCHY: u64 = 3 << 32;
const SEED_KINGDOM: u64 = 4 << 32;
const SEED_EMPIRE: u64 = 5 << 32;

/// Fold holdings upward into counties, duchies, kingdoms and empires.
///
/// Mutates `holdings` only to set each holding's liege and its final color
/// (siblings under one county must not clash, so coloring has to wait until
/// the grouping is known). Fails atomically: a missing key or descriptor at
/// any tier aborts the whole build.
pub fn assemble(
    holdings: &mut [Holding],
    keys: &HierarchyKeys,
) -> Result<Hierarchy, ConvertError> {
    holdings.sort_unstable_by_key(|h| h.id);

    // Relation tables first, all validated before any entity is built.
    let county_groups = group_children(
        "holding",
        holdings.iter().map(|h| h.id),
        &keys.county_of_holding,
    )?;
    let duchy_groups = group_children(
        "county",
        county_groups.keys().copied(),
        &keys.duchy_of_county,
    )?;
    let kingdom_groups = group_children(
        "duchy",
        duchy_groups.keys().copied(),
        &keys.kingdom_of_duchy,
    )?;
    let empire_groups = group_children(
        "kingdom",
        kingdom_groups.keys().copied(),
        &keys.empire_of_kingdom,
    )?;

    let holding_index: HashMap<u32, usize> = holdings
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.id, idx))
        .collect();

    // Counties; holdings get their liege and sibling color here.
    let mut counties: BTreeMap<u32, County> = BTreeMap::new();
    for (&county_id, members) in &county_groups {
        let spec = spec_for("county", &keys.counties, county_id)?;
        let capital = pick_capital(spec, members);
        for (ordinal, holding_id) in members.iter().enumerate() {
            let holding = &mut holdings[holding_index[holding_id]];
            holding.liege = Some(TitleId::County(county_id));
            holding.color = palette::sibling_color(SEED_HOLDING | county_id as u64, ordinal);
        }
        let capital_name = holdings[holding_index[&capital]].name.clone();
        let name = if spec.name.is_empty() {
            capital_name.clone()
        } else {
            spec.name.clone()
        };
        counties.insert(
            county_id,
            County {
                id: county_id,
                name,
                color: [0; 3],
                capital,
                capital_name,
                holdings: members.clone(),
                liege: None,
                holder: None,
            },
        );
    }

    // Duchies; counties get liege + color.
    let mut duchies: BTreeMap<u32, Duchy> = BTreeMap::new();
    for (&duchy_id, members) in &duchy_groups {
        let spec = spec_for("duchy", &keys.duchies, duchy_id)?;
        let capital = pick_capital(spec, members);
        for (ordinal, county_id) in members.iter().enumerate() {
            let county = counties
                .get_mut(county_id)
                .ok_or_else(|| ConvertError::DataIntegrity(format!("county {} vanished", county_id)))?;
            county.liege = Some(TitleId::Duchy(duchy_id));
            county.color = palette::sibling_color(SEED_COUNTY | duchy_id as u64, ordinal);
        }
        let capital_name = counties[&capital].capital_name.clone();
        let name = if spec.name.is_empty() {
            counties[&capital].name.clone()
        } else {
            spec.name.clone()
        };
        duchies.insert(
            duchy_id,
            Duchy {
                id: duchy_id,
                name,
                color: [0; 3],
                capital,
                capital_name,
                counties: members.clone(),
                liege: None,
                holder: None,
            },
        );
    }

    // Kingdoms; duchies get liege + color.
    let mut kingdoms: BTreeMap<u32, Kingdom> = BTreeMap::new();
    for (&kingdom_id, members) in &kingdom_groups {
        let spec = spec_for("kingdom", &keys.kingdoms, kingdom_id)?;
        let capital = pick_capital(spec, members);
        for (ordinal, duchy_id) in members.iter().enumerate() {
            let duchy = duchies
                .get_mut(duchy_id)
                .ok_or_else(|| ConvertError::DataIntegrity(format!("duchy {} vanished", duchy_id)))?;
            duchy.liege = Some(TitleId::Kingdom(kingdom_id));
            duchy.color = palette::sibling_color(SEED_DUCHY | kingdom_id as u64, ordinal);
        }
        let capital_name = duchies[&capital].capital_name.clone();
        let name = if spec.name.is_empty() {
            duchies[&capital].name.clone()
        } else {
            spec.name.clone()
        };
        kingdoms.insert(
            kingdom_id,
            Kingdom {
                id: kingdom_id,
                name,
                color: [0; 3],
                capital,
                capital_name,
                duchies: members.clone(),
                allowed: spec.allowed,
                liege: None,
                holder: None,
            },
        );
    }

    // Empires; kingdoms get liege + color, empires get theirs directly.
    let mut empires: BTreeMap<u32, Empire> = BTreeMap::new();
    for (empire_ordinal, (&empire_id, members)) in empire_groups.iter().enumerate() {
        let spec = spec_for("empire", &keys.empires, empire_id)?;
        let capital = pick_capital(spec, members);
        for (ordinal, kingdom_id) in members.iter().enumerate() {
            let kingdom = kingdoms
                .get_mut(kingdom_id)
                .ok_or_else(|| ConvertError::DataIntegrity(format!("kingdom {} vanished", kingdom_id)))?;
            kingdom.liege = Some(TitleId::Empire(empire_id));
            kingdom.color = palette::sibling_color(SEED_KINGDOM | empire_id as u64, ordinal);
        }
        let capital_name = kingdoms[&capital].capital_name.clone();
        let name = if spec.name.is_empty() {
            kingdoms[&capital].name.clone()
        } else {
            spec.name.clone()
        };
        empires.insert(
            empire_id,
            Empire {
                id: empire_id,
                name,
                color: palette::sibling_color(SEED_EMPIRE, empire_ordinal),
                capital,
                capital_name,
                kingdoms: members.clone(),
                allowed: spec.allowed,
                holder: None,
            },
        );
    }

    log::info!(
        "Assembled hierarchy: {} counties, {} duchies, {} kingdoms, {} empires",
        counties.len(),
        duchies.len(),
        kingdoms.len(),
        empires.len()
    );

    Ok(Hierarchy {
        counties,
        duchies,
        kingdoms,
        empires,
        county_of_holding: county_groups
            .iter()
            .flat_map(|(&c, members)| members.iter().map(move |&h| (h, c)))
            .collect(),
        duchy_of_county: duchy_groups
            .iter()
            .flat_map(|(&d, members)| members.iter().map(move |&c| (c, d)))
            .collect(),
        kingdom_of_duchy: kingdom_groups
            .iter()
            .flat_map(|(&k, members)| members.iter().map(move |&d| (d, k)))
            .collect(),
        empire_of_kingdom: empire_groups
            .iter()
            .flat_map(|(&e, members)| members.iter().map(move |&k| (k, e)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(id: u32, state: u32, name: &str) -> Holding {
        Holding {
            id,
            name: name.to_string(),
            color: [0; 3],
            cells: vec![id],
            settlement: Some(id),
            state,
            liege: None,
        }
    }

    /// Two sibling counties (5 and 7 holdings) under one duchy: one capital,
    /// and every holding's liege chain resolves to that single duchy.
    #[test]
    fn test_two_counties_under_one_duchy() {
        let mut holdings: Vec<Holding> = (1..=5)
            .map(|i| holding(i, 10, &format!("west_{}", i)))
            .chain((6..=12).map(|i| holding(i, 20, &format!("east_{}", i))))
            .collect();

        let mut keys = HierarchyKeys::default();
        for h in &holdings {
            keys.county_of_holding
                .insert(h.id, if h.state == 10 { 100 } else { 200 });
        }
        keys.counties.insert(100, GroupSpec::named(100, "Westmark"));
        keys.counties.insert(200, GroupSpec::named(200, "Eastmark"));
        keys.duchy_of_county.insert(100, 500);
        keys.duchy_of_county.insert(200, 500);
        keys.duchies.insert(500, GroupSpec::named(500, "Middenland"));
        keys.kingdom_of_duchy.insert(500, 900);
        keys.kingdoms.insert(900, GroupSpec::named(900, "Reikland"));
        keys.empire_of_kingdom.insert(900, 1);
        keys.empires.insert(1, GroupSpec::named(1, "The Empire"));

        let hierarchy = assemble(&mut holdings, &keys).unwrap();

        let duchy = &hierarchy.duchies[&500];
        assert_eq!(duchy.counties, vec![100, 200]);
        // Capital drawn from exactly one county's holdings.
        assert_eq!(duchy.capital, 100);
        assert_eq!(duchy.capital_name, "west_1");

        for h in &holdings {
            let chain = hierarchy.liege_chain(TitleId::Holding(h.id));
            assert!(chain.contains(&TitleId::Duchy(500)), "holding {}", h.id);
            assert_eq!(chain.last(), Some(&TitleId::Empire(1)));
        }

        // Sibling colors distinct within each county.
        for county in hierarchy.counties.values() {
            let mut seen = std::collections::HashSet::new();
            for id in &county.holdings {
                let c = holdings.iter().find(|h| h.id == *id).unwrap().color;
                assert!(seen.insert(c), "duplicate color under county {}", county.id);
            }
        }
    }

    /// Every tier answers the same questions through the trait: tag, name,
    /// color, capital and liege, with the holding bottom and empire root as
    /// the two special cases.
    #[test]
    fn test_title_trait_uniform_across_tiers() {
        let mut holdings = vec![holding(1, 10, "a"), holding(2, 10, "b")];
        let keys = HierarchyKeys::from_states(&[], &holdings);
        let hierarchy = assemble(&mut holdings, &keys).unwrap();

        let tiers: Vec<&dyn Title> = vec![
            &holdings[0],
            &hierarchy.counties[&10],
            &hierarchy.duchies[&10],
            &hierarchy.kingdoms[&10],
            &hierarchy.empires[&1],
        ];

        let tags: Vec<String> = tiers.iter().map(|t| t.title_id().tag()).collect();
        assert_eq!(tags, vec!["b_1", "c_10", "d_10", "k_10", "e_1"]);

        // No capital below county level; above it the name chains down to
        // the capital holding.
        assert_eq!(tiers[0].capital_name(), None);
        for t in &tiers[1..] {
            assert_eq!(t.capital_name(), Some("a"));
        }

        // Trait lieges agree with the relation tables; the empire is root.
        for t in &tiers {
            assert_eq!(t.liege(), hierarchy.liege_of(t.title_id()));
        }
        assert_eq!(tiers[0].liege(), Some(TitleId::County(10)));
        assert_eq!(tiers[4].liege(), None);

        // Unnamed specs fall back to the capital name; colors are assigned.
        assert_eq!(tiers[1].name(), "a");
        assert_ne!(tiers[0].color(), [0; 3]);
        assert_ne!(tiers[4].color(), [0; 3]);
    }

    #[test]
    fn test_missing_grouping_key_fails_atomically() {
        let mut holdings = vec![holding(1, 10, "a"), holding(2, 10, "b")];
        let mut keys = HierarchyKeys::default();
        keys.county_of_holding.insert(1, 100);
        // Holding 2 has no key.
        keys.counties.insert(100, GroupSpec::named(100, "Westmark"));
        let err = assemble(&mut holdings, &keys).unwrap_err();
        assert!(matches!(err, ConvertError::DataIntegrity(_)));
        assert!(err.to_string().contains("holding 2"));
    }

    #[test]
    fn test_designated_capital_overrides_lowest_id() {
        let mut holdings = vec![holding(1, 10, "a"), holding(2, 10, "b")];
        let mut keys = HierarchyKeys::from_states(&[], &holdings);
        if let Some(spec) = keys.counties.get_mut(&10) {
            spec.capital = Some(2);
        }
        let hierarchy = assemble(&mut holdings, &keys).unwrap();
        assert_eq!(hierarchy.counties[&10].capital, 2);
        assert_eq!(hierarchy.counties[&10].capital_name, "b");
    }

    #[test]
    fn test_disallowed_kingdom_still_built_but_not_emitted() {
        let mut holdings = vec![holding(1, 10, "a")];
        let mut keys = HierarchyKeys::from_states(&[], &holdings);
        if let Some(spec) = keys.kingdoms.get_mut(&10) {
            spec.allowed = false;
        }
        let hierarchy = assemble(&mut holdings, &keys).unwrap();
        assert!(hierarchy.kingdoms.contains_key(&10));
        assert_eq!(hierarchy.emittable_kingdoms().count(), 0);
        // The county below still has a valid parent to link to.
        assert_eq!(
            hierarchy.liege_of(TitleId::Duchy(10)),
            Some(TitleId::Kingdom(10))
        );
    }

    #[test]
    fn test_strict_tree_single_path_to_root() {
        let mut holdings: Vec<Holding> = (1..=6)
            .map(|i| holding(i, (i % 3) + 1, &format!("h{}", i)))
            .collect();
        let keys = HierarchyKeys::from_states(&[], &holdings);
        let hierarchy = assemble(&mut holdings, &keys).unwrap();

        for h in &holdings {
            let chain = hierarchy.liege_chain(TitleId::Holding(h.id));
            // County, duchy, kingdom, empire: one path, one root.
            assert_eq!(chain.len(), 4, "holding {}: {:?}", h.id, chain);
            assert!(matches!(chain[0], TitleId::County(_)));
            assert!(matches!(chain[3], TitleId::Empire(_)));
        }

        // No shared children anywhere.
        let mut seen = std::collections::HashSet::new();
        for county in hierarchy.counties.values() {
            for id in &county.holdings {
                assert!(seen.insert(*id), "holding {} owned twice", id);
            }
        }
    }

    #[test]
    fn test_liege_set_right_after_grouping() {
        let mut holdings = vec![holding(1, 10, "a")];
        let keys = HierarchyKeys::from_states(&[], &holdings);
        let hierarchy = assemble(&mut holdings, &keys).unwrap();
        assert_eq!(holdings[0].liege, Some(TitleId::County(10)));
        assert_eq!(
            hierarchy.counties[&10].liege,
            Some(TitleId::Duchy(10))
        );
        assert_eq!(
            hierarchy.duchies[&10].liege,
            Some(TitleId::Kingdom(10))
        );
        assert_eq!(
            hierarchy.kingdoms[&10].liege,
            Some(TitleId::Empire(1))
        );
    }

    #[test]
    fn test_assign_holder_is_external_and_many_to_one() {
        let mut holdings = vec![holding(1, 10, "a"), holding(2, 20, "b")];
        let keys = HierarchyKeys::from_states(&[], &holdings);
        let mut hierarchy = assemble(&mut holdings, &keys).unwrap();

        assert!(hierarchy.counties.values().all(|c| c.holder.is_none()));

        let ruler = Character {
            id: "char_1".to_string(),
        };
        hierarchy
            .assign_holder(TitleId::County(10), &ruler)
            .unwrap();
        hierarchy
            .assign_holder(TitleId::Kingdom(20), &ruler)
            .unwrap();
        assert_eq!(hierarchy.counties[&10].holder.as_deref(), Some("char_1"));
        assert_eq!(hierarchy.kingdoms[&20].holder.as_deref(), Some("char_1"));
        assert!(hierarchy.assign_holder(TitleId::County(999), &ruler).is_err());
    }
}
