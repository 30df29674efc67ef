mod attachment_dto;
mod case_dto;
mod report_dto;
mod thread_dto;

pub use attachment_dto::{
    AttachmentDownload, AttachmentDto, DeleteAttachmentResponseDto, UploadAttachmentDto,
    UploadedFile,
};
pub use case_dto::{
    AuditEntryDto, CaseListQuery, ManagerCaseDetailDto, ManagerCaseSummaryDto,
    ReporterIdentityDto, UpdateCaseDto,
};
pub use report_dto::{AnonymousReportCreatedDto, CreateReportDto, IdentifiedReportCreatedDto};
pub use thread_dto::{
    AnonymousThreadDto, MessageDto, PostMessageDto, ReporterCaseDetailDto,
    ReporterCaseSummaryDto,
};
