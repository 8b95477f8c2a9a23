use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Command {
    pub id: i64,
    pub bot_id: i64,
    pub command_name: String,
    pub response_text: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SaveCommandRequest {
    pub command_name: String,
    pub response_text: String,
    pub is_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommandsResponse {
    pub commands: Vec<Command>,
}

#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    pub command: Command,
}

pub struct DefaultCommand {
    pub command_name: &'static str,
    pub description: &'static str,
    pub default_text: &'static str,
}

/// Commands every store bot answers, with the reply used until the operator
/// saves their own.
pub const DEFAULT_STORE_COMMANDS: [DefaultCommand; 5] = [
    DefaultCommand {
        command_name: "/start",
        description: "Pesan selamat datang",
        default_text: "Selamat datang di toko kami! 🛒\n\nGunakan menu di bawah untuk melihat produk.",
    },
    DefaultCommand {
        command_name: "/menu",
        description: "Menu utama",
        default_text: "📋 Menu Utama\n\nPilih kategori produk di bawah ini:",
    },
    DefaultCommand {
        command_name: "/help",
        description: "Bantuan",
        default_text: "❓ Bantuan\n\n/start - Mulai\n/menu - Lihat menu\n/order - Pesanan saya\n/help - Bantuan",
    },
    DefaultCommand {
        command_name: "/order",
        description: "Cek pesanan",
        default_text: "📦 Pesanan Anda\n\nTidak ada pesanan aktif.",
    },
    DefaultCommand {
        command_name: "/contact",
        description: "Kontak admin",
        default_text: "📞 Hubungi Admin\n\nUntuk bantuan, hubungi @admin",
    },
];

pub fn default_command(name: &str) -> Option<&'static DefaultCommand> {
    DEFAULT_STORE_COMMANDS
        .iter()
        .find(|cmd| cmd.command_name == name)
}
