//! Well-known program and sysvar ids.
//!
//! Program-derived addresses come from [`Pubkey::try_find_program_address`];
//! the wallet's seed schemes live with the account lists that use them.

use solana_pubkey::{Pubkey, pubkey};

/// The system program.
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

pub const SYSVAR_CLOCK_ID: Pubkey = pubkey!("SysvarC1ock11111111111111111111111111111111");

pub const SYSVAR_INSTRUCTIONS_ID: Pubkey = pubkey!("Sysvar1nstructions1111111111111111111111111");

/// The native P-256 signature verifier.
pub const SECP256R1_PROGRAM_ID: Pubkey = pubkey!("Secp256r1SigVerify1111111111111111111111111");

/// The deployed Moon wallet program.
pub const MOON_WALLET_PROGRAM_ID: Pubkey = pubkey!("5tFJskbgqrPxb992SUf6JzcQWJGbJuvsta2pRnZBcygN");

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn well_known_ids_have_the_expected_bytes() {
        assert_eq!(SYSTEM_PROGRAM_ID.to_bytes(), [0; 32]);
        assert_eq!(
            SYSVAR_CLOCK_ID.to_bytes(),
            [
                0x06, 0xa7, 0xd5, 0x17, 0x18, 0xc7, 0x74, 0xc9, 0x28, 0x56, 0x63, 0x98, 0x69, 0x1d,
                0x5e, 0xb6, 0x8b, 0x5e, 0xb8, 0xa3, 0x9b, 0x4b, 0x6d, 0x5c, 0x73, 0x55, 0x5b, 0x21,
                0x00, 0x00, 0x00, 0x00,
            ]
        );
        assert_eq!(
            SECP256R1_PROGRAM_ID.to_bytes(),
            [
                0x06, 0x92, 0x0d, 0xec, 0x2f, 0xea, 0x71, 0xb5, 0xb7, 0x23, 0x81, 0x4d, 0x74, 0x2d,
                0xa9, 0x03, 0x1c, 0x83, 0xe7, 0x5f, 0xdb, 0x79, 0x5d, 0x56, 0x8e, 0x75, 0x47, 0x80,
                0x20, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn derived_addresses_are_off_curve_and_reproducible() -> anyhow::Result<()> {
        let multisig = Pubkey::new_from_array([3; 32]);
        let guardian_id = 1u64.to_le_bytes();
        let seeds: [&[u8]; 3] = [b"guardian", multisig.as_ref(), &guardian_id];

        let (address, bump) = Pubkey::try_find_program_address(&seeds, &MOON_WALLET_PROGRAM_ID)
            .ok_or_else(|| anyhow::anyhow!("no viable bump"))?;
        assert!(!address.is_on_curve());

        let bump_seed = [bump];
        let recreated = Pubkey::create_program_address(
            &[seeds[0], seeds[1], seeds[2], &bump_seed],
            &MOON_WALLET_PROGRAM_ID,
        )?;
        assert_eq!(recreated, address);
        Ok(())
    }

    #[test]
    fn it_refuses_oversized_seeds() {
        let long = [0u8; 33];
        assert_eq!(
            Pubkey::try_find_program_address(&[&long], &MOON_WALLET_PROGRAM_ID),
            None
        );
    }
}
