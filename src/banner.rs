//! Startup banner.

use std::net::SocketAddr;

use crate::consts::VERSION;

/// Server configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub bind: SocketAddr,
    pub database: &'a str,
    pub breeds: &'a str,
}

/// Print the startup banner with server info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║            S P Y   C A T S            ║
   ║      agency mission control desk      ║
   ╚═══════════════════════════════════════╝

   version   {}
   listen    http://{}
   database  {}
   breeds    {}
"#,
        VERSION, info.bind, info.database, info.breeds,
    );
}
