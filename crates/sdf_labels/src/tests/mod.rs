//! Scenario tests spanning atlas, labels and pool

mod atlas_scenarios;
mod label_scenarios;
