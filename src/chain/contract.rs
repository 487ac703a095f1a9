//! Bindings for the `.fam` domain registry contract.
//!
//! Only the two functions the minter touches are declared.

use ethers::prelude::abigen;

abigen!(
    DomainRegistry,
    r#"[
        function checkDomainExists(string name) external view returns (bool)
        function mintDomain(address owner, string name) external
    ]"#
);
