use eframe::egui::Color32;

use crate::entity::EntityType;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityStyle {
    pub label: &'static str,
    pub color: Color32,
}

pub fn entity_style(entity_type: EntityType) -> EntityStyle {
    let (label, [r, g, b]) = match entity_type {
        EntityType::Risk => ("Risk", [231, 76, 60]),
        EntityType::Control => ("Control", [46, 204, 113]),
        EntityType::Policy => ("Policy", [52, 152, 219]),
        EntityType::Asset => ("Asset", [241, 196, 15]),
        EntityType::Vendor => ("Vendor", [155, 89, 182]),
        EntityType::Incident => ("Incident", [230, 126, 34]),
        EntityType::Vulnerability => ("Vulnerability", [192, 57, 43]),
        EntityType::Threat => ("Threat", [211, 84, 0]),
        EntityType::Finding => ("Finding", [243, 156, 18]),
        EntityType::Evidence => ("Evidence", [26, 188, 156]),
        EntityType::Framework => ("Framework", [41, 128, 185]),
        EntityType::Requirement => ("Requirement", [93, 173, 226]),
        EntityType::Audit => ("Audit", [142, 68, 173]),
        EntityType::Issue => ("Issue", [236, 112, 99]),
        EntityType::Exception => ("Exception", [245, 176, 65]),
        EntityType::Process => ("Process", [22, 160, 133]),
        EntityType::Application => ("Application", [72, 201, 176]),
        EntityType::System => ("System", [127, 140, 141]),
        EntityType::Dataset => ("Dataset", [175, 122, 197]),
        EntityType::Person => ("Person", [244, 208, 63]),
        EntityType::Team => ("Team", [88, 214, 141]),
        EntityType::Department => ("Department", [133, 193, 233]),
        EntityType::Location => ("Location", [202, 111, 30]),
        EntityType::Contract => ("Contract", [165, 105, 189]),
        EntityType::Regulation => ("Regulation", [40, 116, 166]),
    };

    EntityStyle {
        label,
        color: Color32::from_rgb(r, g, b),
    }
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Translucent fill for a cluster region behind its members.
pub fn region_fill(color: Color32) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), 28)
}

pub const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub const EDGE: Color32 = Color32::from_rgb(110, 122, 138);
pub const EDGE_HIGHLIGHT: Color32 = Color32::from_rgb(241, 146, 94);
pub const LABEL: Color32 = Color32::from_gray(238);
pub const EDGE_LABEL: Color32 = Color32::from_gray(170);
pub const TOOLTIP_FILL: Color32 = Color32::from_rgb(32, 37, 46);
