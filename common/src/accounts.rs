//! Fixed signing identities for the local devnet.
//!
//! The devnet seeds these four accounts with funds at genesis, so tests can
//! sign and pay fees without any faucet step. Account 0 is also the identity
//! the node itself runs under and the one that funds deployments.

/// A devnet key/address pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestAccount {
    pub private_key: &'static str,
    pub address: &'static str,
}

impl TestAccount {
    /// Index into [`DEFAULT_ACCOUNTS`], panicking on out-of-range; test
    /// code only ever asks for accounts 0..=3.
    pub fn nth(index: usize) -> &'static TestAccount {
        &DEFAULT_ACCOUNTS[index]
    }
}

/// The well-known local-devnet accounts, in funding order.
pub const DEFAULT_ACCOUNTS: [TestAccount; 4] = [
    TestAccount {
        private_key: "APrivateKey1zkp8CZNn3yeCseEtxuVPbDCwSyhGW6yZKUYKfgXmcpoGPWH",
        address: "aleo1rhgdu77hgyqd3xjj8ucu3jj9r2krwz6mnzyd80gncr5fxcwlh5rsvzp9px",
    },
    TestAccount {
        private_key: "APrivateKey1zkp2RWGDcde3efb89rjhME1VYA8QMxcxep5DShNBR6n8Yjh",
        address: "aleo1s3ws5tra87fjycnjrwsjcrnw2qxr8jfqqdugnf0xzqqw29q9m5pqem2u4t",
    },
    TestAccount {
        private_key: "APrivateKey1zkp2GUmKbVsuc1NSj28pa1WTQuZaK5f1DQJAT6vPcHyWokG",
        address: "aleo1ashyu96tjwe63u0gtnnv8z5lhapdu4l5pjsl2kha7fv7hvz2eqxs5dz0rg",
    },
    TestAccount {
        private_key: "APrivateKey1zkpBjpEgLo4arVUkQmcLdKQMiAKGaHAQVVwmF8HQby8vdYs",
        address: "aleo12ux3gdauck0v60westgcpqj7v8rrcr3v346e4jtq04q7kkt22czsh808v2",
    },
];
