//! Sidebar layout shared by every dashboard page.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavSection {
    pub key: &'static str,
    pub name: &'static str,
    /// Every path under this prefix belongs to the section.
    pub prefix: &'static str,
    pub routes: &'static [NavItem],
}

pub const DASHBOARD: &str = "/dashboard";
pub const BOTS: &str = "/dashboard/bots";
pub const STORE: &str = "/dashboard/store";
pub const STORE_PRODUCTS: &str = "/dashboard/store/products";
pub const STORE_TRANSACTIONS: &str = "/dashboard/store/transactions";
pub const STORE_USERS: &str = "/dashboard/store/users";
pub const STORE_COMMANDS: &str = "/dashboard/store/commands";
pub const VERIFICATION: &str = "/dashboard/verification";
pub const VERIFICATION_HISTORY: &str = "/dashboard/verification/history";
pub const SETTINGS: &str = "/dashboard/settings";

pub static MENU_ITEMS: [NavItem; 2] = [
    NavItem {
        name: "Dashboard",
        href: DASHBOARD,
    },
    NavItem {
        name: "Semua Bot",
        href: BOTS,
    },
];

pub static SECTIONS: [NavSection; 2] = [
    NavSection {
        key: "store",
        name: "Store Bots",
        prefix: STORE,
        routes: &[
            NavItem {
                name: "Daftar Bot",
                href: STORE,
            },
            NavItem {
                name: "Produk",
                href: STORE_PRODUCTS,
            },
            NavItem {
                name: "Transaksi",
                href: STORE_TRANSACTIONS,
            },
        ],
    },
    NavSection {
        key: "verification",
        name: "SheerID Verify",
        prefix: VERIFICATION,
        routes: &[
            NavItem {
                name: "Submit Verifikasi",
                href: VERIFICATION,
            },
            NavItem {
                name: "Riwayat",
                href: VERIFICATION_HISTORY,
            },
        ],
    },
];

pub static BOTTOM_ITEMS: [NavItem; 1] = [NavItem {
    name: "Pengaturan",
    href: SETTINGS,
}];

/// Items light up on an exact path match only.
pub fn is_item_active(path: &str, item: &NavItem) -> bool {
    path == item.href
}

pub fn is_section_active(path: &str, section: &NavSection) -> bool {
    path.starts_with(section.prefix)
}

pub fn active_section(path: &str) -> Option<&'static NavSection> {
    SECTIONS.iter().find(|s| is_section_active(path, s))
}

/// Names leading to `path`, e.g. `["Store Bots", "Produk"]`.
pub fn breadcrumb(path: &str) -> Vec<&'static str> {
    if let Some(item) = MENU_ITEMS
        .iter()
        .chain(BOTTOM_ITEMS.iter())
        .find(|i| is_item_active(path, i))
    {
        return vec![item.name];
    }
    if let Some(section) = active_section(path) {
        let mut crumbs = vec![section.name];
        if let Some(route) = section.routes.iter().find(|r| is_item_active(path, r)) {
            crumbs.push(route.name);
        }
        return crumbs;
    }
    if path.starts_with(BOTS) {
        return vec!["Semua Bot", "Detail"];
    }
    Vec::new()
}

/// Sidebar state: which bot-type section is unfolded.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    pub expanded: Option<&'static str>,
}

impl Sidebar {
    /// Starts with the section of the current path unfolded.
    pub fn for_path(path: &str) -> Self {
        Self {
            expanded: active_section(path).map(|s| s.key),
        }
    }

    pub fn toggle(&mut self, key: &str) {
        let section = SECTIONS.iter().find(|s| s.key == key).map(|s| s.key);
        self.expanded = if self.expanded == section { None } else { section };
    }

    pub fn render(&self, path: &str, user: Option<&str>) -> String {
        let mut out = String::new();
        let marker = |active: bool| if active { '>' } else { ' ' };

        for item in &MENU_ITEMS {
            let _ = writeln!(out, "{} {}", marker(is_item_active(path, item)), item.name);
        }
        for section in &SECTIONS {
            let open = self.expanded == Some(section.key);
            let _ = writeln!(
                out,
                "{} {} {}",
                marker(is_section_active(path, section)),
                if open { 'v' } else { '+' },
                section.name,
            );
            if open {
                for route in section.routes {
                    let _ = writeln!(out, "  {}   {}", marker(is_item_active(path, route)), route.name);
                }
            }
        }
        for item in &BOTTOM_ITEMS {
            let _ = writeln!(out, "{} {}", marker(is_item_active(path, item)), item.name);
        }
        if let Some(user) = user {
            let _ = writeln!(out, "  {user} [logout]");
        }
        out
    }
}
