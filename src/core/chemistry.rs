/// Chemical element data needed by the protocols.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub mass: f64, // amu
}

const fn el(symbol: &'static str, mass: f64) -> Element {
    Element { symbol, mass }
}

/// Standard atomic weights, H through Kr plus common heavier metals.
static ELEMENTS: &[Element] = &[
    el("H", 1.008),
    el("He", 4.0026),
    el("Li", 6.94),
    el("Be", 9.0122),
    el("B", 10.81),
    el("C", 12.011),
    el("N", 14.007),
    el("O", 15.999),
    el("F", 18.998),
    el("Ne", 20.180),
    el("Na", 22.990),
    el("Mg", 24.305),
    el("Al", 26.982),
    el("Si", 28.085),
    el("P", 30.974),
    el("S", 32.06),
    el("Cl", 35.45),
    el("Ar", 39.948),
    el("K", 39.098),
    el("Ca", 40.078),
    el("Sc", 44.956),
    el("Ti", 47.867),
    el("V", 50.942),
    el("Cr", 51.996),
    el("Mn", 54.938),
    el("Fe", 55.845),
    el("Co", 58.933),
    el("Ni", 58.693),
    el("Cu", 63.546),
    el("Zn", 65.38),
    el("Ga", 69.723),
    el("Ge", 72.630),
    el("As", 74.922),
    el("Se", 78.971),
    el("Br", 79.904),
    el("Kr", 83.798),
    el("Zr", 91.224),
    el("Mo", 95.95),
    el("Pd", 106.42),
    el("Ag", 107.87),
    el("Sn", 118.71),
    el("Hf", 178.49),
    el("Ta", 180.95),
    el("W", 183.84),
    el("Pt", 195.08),
    el("Au", 196.97),
    el("Pb", 207.2),
];

pub fn element(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

pub fn atomic_mass(symbol: &str) -> Option<f64> {
    element(symbol).map(|e| e.mass)
}
