//! Misc utils

use ethers::{
    prelude::rand::{self, RngCore},
    types::{Address, H256},
    utils::{get_create2_address_from_hash, keccak256, to_checksum},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Creation code of an ERC-1167 minimal proxy delegating to `implementation`
pub fn minimal_proxy_code(implementation: &Address) -> Vec<u8> {
    [
        &[
            0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37,
            0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73,
        ][..],
        implementation.as_bytes(),
        &[0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3][..],
    ]
    .concat()
}

/// Address of the clone `deployer` creates for `implementation` with CREATE2 and `salt`
pub fn predict_deterministic_address(
    implementation: &Address,
    salt: H256,
    deployer: &Address,
) -> Address {
    let code_hash = keccak256(minimal_proxy_code(implementation));
    get_create2_address_from_hash(*deployer, salt.as_bytes().to_vec(), code_hash)
}

/// Fresh salt: milliseconds since the epoch followed by 24 random bytes
pub fn random_salt() -> H256 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    let mut salt = [0u8; 32];
    salt[..8].copy_from_slice(&(millis as u64).to_be_bytes());
    rand::thread_rng().fill_bytes(&mut salt[8..]);
    H256(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_address_needs_20_bytes() {
        assert_eq!(get_address(&[1u8; 19]), None);
        assert_eq!(get_address(&[1u8; 24]), Some(Address::repeat_byte(1)));
    }

    #[test]
    fn predict_clone_address() {
        let implementation = Address::repeat_byte(0x22);
        let deployer = Address::repeat_byte(0x33);
        assert_eq!(minimal_proxy_code(&implementation).len(), 55);

        let first = predict_deterministic_address(&implementation, H256::zero(), &deployer);
        assert_eq!(
            first,
            "0x6407ef2d64db4461268a12a0c6112b1f3f602ec6".parse::<Address>().unwrap()
        );
        assert_eq!(first, predict_deterministic_address(&implementation, H256::zero(), &deployer));
        assert_eq!(
            predict_deterministic_address(&implementation, H256::from_low_u64_be(1), &deployer),
            "0xaf6645c4e64ec287dadcf3622414ca52682deadb".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn clone_addresses_do_not_collide() {
        let implementation = Address::repeat_byte(0x22);
        let deployer = Address::repeat_byte(0x33);
        let addresses: std::collections::HashSet<_> = (0..256u64)
            .map(|i| predict_deterministic_address(&implementation, H256::from_low_u64_be(i), &deployer))
            .collect();
        assert_eq!(addresses.len(), 256);
    }

    #[test]
    fn random_salts_differ() {
        assert_ne!(random_salt(), random_salt());
    }
}
