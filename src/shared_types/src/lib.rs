//! Generated TypeScript types of the onboarding core live in `generated/`.
