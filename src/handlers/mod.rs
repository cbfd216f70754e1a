pub mod charter_parties;
