// handlers/mod.rs - Two handler tiers
//
// Public (no session) → Protected (session + access check on every request)
pub mod protected; // /api/:resource[/:id]
pub mod public; // /, /health
