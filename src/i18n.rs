use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Id,
    En,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Locale {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("en") {
            Locale::En
        } else {
            Locale::Id
        }
    }
}

/// Shown when the backend answered with an error but no message.
pub fn generic_error(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Terjadi kesalahan",
        Locale::En => "Something went wrong",
    }
}

/// Shown when no response arrived at all.
pub fn connection_error(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Tidak dapat terhubung ke server",
        Locale::En => "Unable to reach the server",
    }
}

pub fn pakasir_fields_required(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Isi slug dan API key terlebih dahulu",
        Locale::En => "Fill in the slug and API key first",
    }
}

pub fn pakasir_slug_missing(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Project Slug belum diisi",
        Locale::En => "Project slug is empty",
    }
}

pub fn pakasir_key_missing(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "API Key belum diisi",
        Locale::En => "API key is empty",
    }
}

pub fn pakasir_test_failed(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Gagal test koneksi",
        Locale::En => "Connection test failed",
    }
}

pub fn required_field(locale: Locale, field: &str) -> String {
    match locale {
        Locale::Id => format!("{field} wajib diisi"),
        Locale::En => format!("{field} is required"),
    }
}

pub fn invalid_number(locale: Locale, field: &str) -> String {
    match locale {
        Locale::Id => format!("{field} harus berupa angka"),
        Locale::En => format!("{field} must be a number"),
    }
}

pub fn command_saved(locale: Locale, command: &str) -> String {
    match locale {
        Locale::Id => format!("Command {command} berhasil disimpan!"),
        Locale::En => format!("Command {command} saved!"),
    }
}

pub fn settings_saved(locale: Locale) -> &'static str {
    match locale {
        Locale::Id => "Pengaturan berhasil disimpan!",
        Locale::En => "Settings saved!",
    }
}

pub fn status_label(locale: Locale, status: &str) -> Cow<'static, str> {
    match (locale, status) {
        (Locale::Id, "pending") => Cow::Borrowed("Menunggu"),
        (Locale::Id, "paid") => Cow::Borrowed("Dibayar"),
        (Locale::Id, "completed") => Cow::Borrowed("Selesai"),
        (Locale::Id, "cancelled") => Cow::Borrowed("Dibatalkan"),
        (Locale::Id, "success") => Cow::Borrowed("Berhasil"),
        (Locale::Id, "failed") => Cow::Borrowed("Gagal"),
        (Locale::Id, "fraud_review") => Cow::Borrowed("Review Fraud"),
        (Locale::Id, "error") => Cow::Borrowed("Error"),
        (Locale::Id, "doc_upload") => Cow::Borrowed("Upload Dokumen"),
        (_, "pending") => Cow::Borrowed("Pending"),
        (_, "paid") => Cow::Borrowed("Paid"),
        (_, "completed") => Cow::Borrowed("Completed"),
        (_, "cancelled") => Cow::Borrowed("Cancelled"),
        (_, "success") => Cow::Borrowed("Success"),
        (_, "failed") => Cow::Borrowed("Failed"),
        (_, "fraud_review") => Cow::Borrowed("Fraud review"),
        (_, "error") => Cow::Borrowed("Error"),
        (_, "doc_upload") => Cow::Borrowed("Document upload"),
        _ => Cow::Owned(status.to_string()),
    }
}
