use shared_models::pharmacy::BookingDetails;

const UNASSIGNED_STAFF: &str = "our pharmacist";

/// Subject and body of one outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub html: String,
}

/// Display values shared by both emails, escaped once.
struct BookingView {
    service: String,
    date: String,
    time: String,
    staff: String,
    pharmacy: String,
    notes: Option<String>,
}

impl BookingView {
    fn from_details(details: &BookingDetails) -> Self {
        let start = details.booking.booking_start;
        Self {
            service: escape_html(&details.service.display_name()),
            // "Monday 10 June 2024" and "09:30"
            date: start.format("%A %-d %B %Y").to_string(),
            time: start.format("%H:%M").to_string(),
            staff: details
                .staff
                .as_ref()
                .map(|s| escape_html(&s.full_name()))
                .unwrap_or_else(|| UNASSIGNED_STAFF.to_string()),
            pharmacy: escape_html(&details.pharmacy.name),
            notes: details
                .booking
                .notes
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .map(escape_html),
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"<tr><td style="padding: 10px 0; border-bottom: 1px solid #e8e7e3;"><span style="font-size: 14px; color: #666; display: block;">{}</span><span style="font-size: 16px; color: #1a1a1a; font-weight: 600;">{}</span></td></tr>"#,
        label, value
    )
}

fn notes_block(title: &str, notes: &Option<String>) -> String {
    notes
        .as_ref()
        .map(|n| {
            format!(
                r#"<div style="background-color: #fffbf0; border: 1px solid #f5e6b3; border-radius: 12px; padding: 20px; margin-bottom: 24px;"><h3 style="margin: 0 0 8px 0;">{}</h3><p style="margin: 0;">{}</p></div>"#,
                title, n
            )
        })
        .unwrap_or_default()
}

fn layout(title: &str, heading: &str, body: &str, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="margin: 0; padding: 40px 20px; font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f8f7f4;">
<div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 16px; overflow: hidden;">
<div style="background: #1a1a1a; padding: 40px 30px; text-align: center;"><h1 style="color: #ffffff; margin: 0;">{heading}</h1></div>
<div style="padding: 40px 30px;">{body}</div>
<div style="background-color: #f8f7f4; padding: 30px; text-align: center; font-size: 13px; color: #999;">{footer}</div>
</div>
</body>
</html>"#
    )
}

pub fn patient_confirmation(details: &BookingDetails) -> ComposedEmail {
    let view = BookingView::from_details(details);
    let pharmacy = &details.pharmacy;
    let phone = escape_html(pharmacy.phone.as_deref().unwrap_or_default());

    let body = format!(
        r#"<p>Hi <strong>{first_name}</strong>,</p>
<p>Your appointment has been successfully confirmed. Here are your booking details:</p>
<table role="presentation" style="width: 100%; border-collapse: collapse; margin-bottom: 24px;">{service}{date}{time}{staff}</table>
<h2>Location</h2>
<p><strong>{pharmacy}</strong><br/>{address}<br/>{city}, {postcode}<br/><a href="tel:{phone}">{phone}</a></p>
{notes}
<p>Please arrive 5 minutes before your appointment time. If you need to reschedule or cancel, please contact us as soon as possible.</p>"#,
        first_name = escape_html(&details.booking.patient_first_name),
        service = detail_row("Service", &view.service),
        date = detail_row("Date", &view.date),
        time = detail_row("Time", &view.time),
        staff = detail_row("With", &view.staff),
        pharmacy = view.pharmacy,
        address = escape_html(pharmacy.address_line1.as_deref().unwrap_or_default()),
        city = escape_html(pharmacy.city.as_deref().unwrap_or_default()),
        postcode = escape_html(pharmacy.postcode.as_deref().unwrap_or_default()),
        phone = phone,
        notes = notes_block("Your Note", &view.notes),
    );

    let footer = format!(
        "Thank you for choosing {}. This is an automated confirmation email. Please do not reply to this message.",
        view.pharmacy
    );

    ComposedEmail {
        subject: format!("Appointment Confirmed - {}", details.service.display_name()),
        html: layout("Appointment Confirmation", "Appointment Confirmed", &body, &footer),
    }
}

pub fn pharmacy_notification(details: &BookingDetails) -> ComposedEmail {
    let view = BookingView::from_details(details);
    let booking = &details.booking;
    let email = escape_html(&booking.patient_email);

    let phone_row = booking
        .patient_phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| detail_row("Phone", &escape_html(p)))
        .unwrap_or_default();

    let body = format!(
        r#"<p>A new appointment has been booked through your website. Please review the details below:</p>
<h2>Patient Information</h2>
<table role="presentation" style="width: 100%; border-collapse: collapse; margin-bottom: 24px;">{name}{email}{phone}</table>
<h2>Appointment Details</h2>
<table role="presentation" style="width: 100%; border-collapse: collapse; margin-bottom: 24px;">{service}{date}{time}{staff}</table>
{notes}"#,
        name = detail_row("Name", &escape_html(&booking.patient_full_name())),
        email = detail_row("Email", &format!(r#"<a href="mailto:{0}">{0}</a>"#, email)),
        phone = phone_row,
        service = detail_row("Service", &view.service),
        date = detail_row("Date", &view.date),
        time = detail_row("Time", &view.time),
        staff = detail_row("Assigned To", &view.staff),
        notes = notes_block("Patient Note", &view.notes),
    );

    ComposedEmail {
        subject: format!(
            "New Booking: {} - {} at {}",
            details.service.display_name(),
            view.date,
            view.time
        ),
        html: layout(
            "New Booking Notification",
            "New Booking Received",
            &body,
            &format!("Booking ID: {}", booking.id),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared_models::pharmacy::{BookedService, Pharmacy};
    use shared_models::scheduling::{Booking, BookingStatus, StaffName};
    use uuid::Uuid;

    fn details(staff: Option<StaffName>, notes: Option<&str>) -> BookingDetails {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap();
        BookingDetails {
            booking: Booking {
                id: Uuid::new_v4(),
                pharmacy_id: Uuid::new_v4(),
                service_id: Uuid::new_v4(),
                staff_id: None,
                booking_start: start,
                booking_end: start + chrono::Duration::minutes(30),
                patient_first_name: "Jo".to_string(),
                patient_last_name: "Bloggs".to_string(),
                patient_email: "jo@example.com".to_string(),
                patient_phone: Some("07700 900123".to_string()),
                notes: notes.map(str::to_string),
                status: BookingStatus::Pending,
                source: Some("web".to_string()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            service: BookedService { custom_title: Some("Flu jab".to_string()), service_catalogue: None },
            pharmacy: Pharmacy {
                id: None,
                name: "Rank Pharmacy".to_string(),
                primary_email: Some("shop@example.com".to_string()),
                address_line1: Some("1 High Street".to_string()),
                city: Some("Leeds".to_string()),
                postcode: Some("LS1 1AA".to_string()),
                phone: Some("0113 000 0000".to_string()),
            },
            staff,
        }
    }

    #[test]
    fn subjects_carry_service_and_time() {
        let d = details(None, None);
        assert_eq!(patient_confirmation(&d).subject, "Appointment Confirmed - Flu jab");
        assert_eq!(
            pharmacy_notification(&d).subject,
            "New Booking: Flu jab - Monday 10 June 2024 at 09:30"
        );
    }

    #[test]
    fn staff_name_or_placeholder() {
        let unassigned = patient_confirmation(&details(None, None));
        assert!(unassigned.html.contains("our pharmacist"));

        let staff = StaffName { first_name: "Ada".to_string(), last_name: "Okafor".to_string() };
        let assigned = pharmacy_notification(&details(Some(staff), None));
        assert!(assigned.html.contains("Ada Okafor"));
        assert!(!assigned.html.contains("our pharmacist"));
    }

    #[test]
    fn patient_text_is_escaped() {
        let email = pharmacy_notification(&details(None, Some("<script>alert(1)</script>")));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }
}
