#![allow(non_upper_case_globals)]

use super::asn1::ObjectIdentifier;
use crate::oid;

// GM/T 0006 algorithm identifiers.
pub const OidSM2: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 301);
pub const OidSM2Sign: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 301, 1);
pub const OidSM2KeyExchange: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 301, 2);
pub const OidSM2Encrypt: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 301, 3);
pub const OidSM3: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 401);
pub const OidSignatureSM2WithSM3: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 501);
pub const OidSM4: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 104);
pub const OidSM4ECB: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 104, 1);
pub const OidSM4CBC: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 104, 2);
pub const OidSM9: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 302);
pub const OidSM9Sign: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 302, 1);
pub const OidSM9KeyExchange: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 302, 2);
pub const OidSM9Encrypt: ObjectIdentifier = oid!(1, 2, 156, 10197, 1, 302, 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid() {
        assert_eq!("1.2.156.10197.1.501", format!("{}", OidSignatureSM2WithSM3));
        assert_eq!(ObjectIdentifier::try_from("1.2.156.10197.1.104.1").unwrap(), OidSM4ECB);
        assert_eq!(OidSM2.as_der(), [0x2a, 0x81, 0x1c, 0xcf, 0x55, 0x01, 0x82, 0x2d]);
    }
}
