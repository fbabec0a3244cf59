//! Hospital reference list and autocomplete
//!
//! A static list of facilities the shift form offers as suggestions. Picking
//! one fills the shift's coordinates and facility type.

use serde::Serialize;

use crate::shifts::FacilityType::{Clinic, EmergencyUnit, Hospital as H};
use crate::shifts::{Coordinates, FacilityType};
use crate::text::normalize;

/// Queries shorter than this return no suggestions
pub const MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// One reference facility
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Hospital {
    pub name: String,
    pub city: String,
    pub state: String,
    pub coordinates: Coordinates,
    pub facility_type: FacilityType,
}

impl Hospital {
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        lat: f64,
        lng: f64,
        facility_type: FacilityType,
    ) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            state: state.into(),
            coordinates: Coordinates::new(lat, lng),
            facility_type,
        }
    }
}

/// (name, city, state, lat, lng, type)
const REFERENCE: &[(&str, &str, &str, f64, f64, FacilityType)] = &[
    // São Paulo
    ("Hospital Israelita Albert Einstein", "São Paulo", "SP", -23.5997, -46.7155, H),
    ("Hospital Sírio-Libanês", "São Paulo", "SP", -23.5575, -46.6544, H),
    ("Hospital das Clínicas da FMUSP", "São Paulo", "SP", -23.5573, -46.6690, H),
    ("Hospital São Luiz Itaim", "São Paulo", "SP", -23.5857, -46.6776, H),
    ("Hospital Alemão Oswaldo Cruz", "São Paulo", "SP", -23.5694, -46.6423, H),
    ("Hospital Samaritano Higienópolis", "São Paulo", "SP", -23.5433, -46.6610, H),
    ("Hospital do Servidor Público Estadual", "São Paulo", "SP", -23.5896, -46.6487, H),
    ("Hospital São Paulo", "São Paulo", "SP", -23.5986, -46.6441, H),
    ("Santa Casa de Misericórdia de São Paulo", "São Paulo", "SP", -23.5425, -46.6488, H),
    ("Hospital Beneficência Portuguesa", "São Paulo", "SP", -23.5708, -46.6420, H),
    ("Hospital Santa Catarina", "São Paulo", "SP", -23.5672, -46.6476, H),
    ("Hospital Municipal do Campo Limpo", "São Paulo", "SP", -23.6388, -46.7625, H),
    ("Hospital Municipal Tide Setúbal", "São Paulo", "SP", -23.4960, -46.4450, H),
    ("UPA Vergueiro", "São Paulo", "SP", -23.5770, -46.6395, EmergencyUnit),
    ("UPA Santana", "São Paulo", "SP", -23.5030, -46.6260, EmergencyUnit),
    ("UPA Campo Limpo", "São Paulo", "SP", -23.6420, -46.7600, EmergencyUnit),
    ("AMA Especialidades Vila Mariana", "São Paulo", "SP", -23.5885, -46.6340, Clinic),
    ("Hospital de Clínicas da Unicamp", "Campinas", "SP", -22.8290, -47.0610, H),
    // Rio de Janeiro
    ("Hospital Municipal Souza Aguiar", "Rio de Janeiro", "RJ", -22.9081, -43.1875, H),
    ("Hospital Municipal Miguel Couto", "Rio de Janeiro", "RJ", -22.9805, -43.2224, H),
    ("Hospital Copa D'Or", "Rio de Janeiro", "RJ", -22.9652, -43.1861, H),
    ("Hospital Samaritano Botafogo", "Rio de Janeiro", "RJ", -22.9500, -43.1880, H),
    ("Instituto Nacional de Câncer", "Rio de Janeiro", "RJ", -22.9100, -43.1900, H),
    ("Hospital Federal de Bonsucesso", "Rio de Janeiro", "RJ", -22.8632, -43.2518, H),
    ("Clínica São Vicente", "Rio de Janeiro", "RJ", -22.9770, -43.2350, Clinic),
    ("UPA Copacabana", "Rio de Janeiro", "RJ", -22.9680, -43.1870, EmergencyUnit),
    ("UPA Tijuca", "Rio de Janeiro", "RJ", -22.9240, -43.2330, EmergencyUnit),
    // Minas Gerais
    ("Hospital das Clínicas da UFMG", "Belo Horizonte", "MG", -19.9250, -43.9260, H),
    ("Hospital Mater Dei Santo Agostinho", "Belo Horizonte", "MG", -19.9350, -43.9430, H),
    ("Hospital João XXIII", "Belo Horizonte", "MG", -19.9230, -43.9310, H),
    ("Santa Casa de Belo Horizonte", "Belo Horizonte", "MG", -19.9260, -43.9290, H),
    ("UPA Centro-Sul", "Belo Horizonte", "MG", -19.9320, -43.9380, EmergencyUnit),
    // Rio Grande do Sul
    ("Hospital de Clínicas de Porto Alegre", "Porto Alegre", "RS", -30.0389, -51.2066, H),
    ("Hospital Moinhos de Vento", "Porto Alegre", "RS", -30.0254, -51.2088, H),
    ("Hospital de Pronto Socorro de Porto Alegre", "Porto Alegre", "RS", -30.0396, -51.2110, H),
    ("Santa Casa de Misericórdia de Porto Alegre", "Porto Alegre", "RS", -30.0305, -51.2220, H),
    // Paraná
    ("Hospital de Clínicas da UFPR", "Curitiba", "PR", -25.4245, -49.2612, H),
    ("Hospital Pequeno Príncipe", "Curitiba", "PR", -25.4420, -49.2660, H),
    ("Hospital Evangélico Mackenzie", "Curitiba", "PR", -25.4450, -49.2890, H),
    // Bahia
    ("Hospital Geral do Estado", "Salvador", "BA", -12.9920, -38.5070, H),
    ("Hospital São Rafael", "Salvador", "BA", -12.9370, -38.4330, H),
    ("Hospital Aliança", "Salvador", "BA", -12.9990, -38.4680, H),
    // Pernambuco
    ("Hospital da Restauração", "Recife", "PE", -8.0530, -34.8960, H),
    ("Real Hospital Português", "Recife", "PE", -8.0560, -34.8990, H),
    // Ceará
    ("Hospital Geral de Fortaleza", "Fortaleza", "CE", -3.7390, -38.4790, H),
    ("Instituto Dr. José Frota", "Fortaleza", "CE", -3.7300, -38.5250, H),
    // Distrito Federal
    ("Hospital de Base do Distrito Federal", "Brasília", "DF", -15.8000, -47.8880, H),
    ("Hospital Regional da Asa Norte", "Brasília", "DF", -15.7670, -47.8800, H),
    ("UPA Núcleo Bandeirante", "Brasília", "DF", -15.8700, -47.9680, EmergencyUnit),
];

/// Searchable facility list
#[derive(Debug, Clone)]
pub struct HospitalCatalog {
    /// (normalized name, entry), sorted by normalized name
    entries: Vec<(String, Hospital)>,
}

impl Default for HospitalCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

impl HospitalCatalog {
    /// The built-in reference list
    pub fn reference() -> Self {
        Self::from_entries(
            REFERENCE
                .iter()
                .map(|&(name, city, state, lat, lng, kind)| {
                    Hospital::new(name, city, state, lat, lng, kind)
                })
                .collect(),
        )
    }

    pub fn from_entries(hospitals: Vec<Hospital>) -> Self {
        let mut entries: Vec<(String, Hospital)> = hospitals
            .into_iter()
            .map(|h| (normalize(&h.name), h))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Hospital> {
        self.entries.iter().map(|(_, h)| h)
    }

    /// Autocomplete: substring match, prefix matches first, then by name.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<&Hospital> {
        let needle = normalize(query);
        if needle.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let mut prefix = Vec::new();
        let mut inner = Vec::new();

        // entries are already in name order, so each bucket stays sorted
        for (name, hospital) in &self.entries {
            if name.starts_with(&needle) {
                prefix.push(hospital);
            } else if name.contains(&needle) {
                inner.push(hospital);
            }
        }

        prefix.into_iter().chain(inner).take(limit).collect()
    }

    /// Exact (normalized) name lookup
    pub fn find_exact(&self, name: &str) -> Option<&Hospital> {
        let needle = normalize(name);
        self.entries
            .binary_search_by(|(n, _)| n.as_str().cmp(needle.as_str()))
            .ok()
            .and_then(|idx| self.entries.get(idx))
            .map(|(_, h)| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(hits: &[&Hospital]) -> Vec<String> {
        hits.iter().map(|h| h.name.clone()).collect()
    }

    #[test]
    fn test_reference_catalog_is_valid() {
        let catalog = HospitalCatalog::reference();
        assert!(catalog.len() >= 40);
        for hospital in catalog.all() {
            assert!(hospital.coordinates.validate().is_ok(), "{}", hospital.name);
        }
    }

    #[test]
    fn test_search_ignores_case_and_accents() {
        let catalog = HospitalCatalog::reference();
        let hits = catalog.search("sirio-libanes", None);
        assert_eq!(names(&hits), vec!["Hospital Sírio-Libanês".to_string()]);

        let hits = catalog.search("SÍRIO", None);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_prefix_matches_rank_first() {
        let catalog = HospitalCatalog::from_entries(vec![
            Hospital::new("Hospital Central", "X", "SP", 0.0, 0.0, FacilityType::Hospital),
            Hospital::new("Central Clinic", "X", "SP", 0.0, 0.0, FacilityType::Clinic),
            Hospital::new("UPA Central", "X", "SP", 0.0, 0.0, FacilityType::EmergencyUnit),
        ]);

        let hits = catalog.search("central", None);
        assert_eq!(
            names(&hits),
            vec![
                "Central Clinic".to_string(),
                "Hospital Central".to_string(),
                "UPA Central".to_string()
            ]
        );
    }

    #[test]
    fn test_short_query_returns_nothing() {
        let catalog = HospitalCatalog::reference();
        assert!(catalog.search("h", None).is_empty());
        assert!(catalog.search("  ", None).is_empty());
    }

    #[test]
    fn test_limit_is_applied_and_capped() {
        let catalog = HospitalCatalog::reference();
        assert_eq!(catalog.search("hospital", Some(3)).len(), 3);
        assert!(catalog.search("hospital", Some(1000)).len() <= MAX_SEARCH_LIMIT);
        assert_eq!(catalog.search("hospital", Some(0)).len(), 1);
    }

    #[test]
    fn test_find_exact() {
        let catalog = HospitalCatalog::reference();
        let hit = catalog.find_exact("  upa   VERGUEIRO ").unwrap();
        assert_eq!(hit.name, "UPA Vergueiro");
        assert_eq!(hit.facility_type, FacilityType::EmergencyUnit);

        assert!(catalog.find_exact("UPA Verg").is_none());
    }
}
